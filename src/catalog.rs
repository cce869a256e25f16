use std::fmt;

/// UI grouping for resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceGroup {
    Pc,
    Laptop,
    Mobile,
}

impl ResourceGroup {
    /// Display order.
    pub const ALL: [ResourceGroup; 3] = [ResourceGroup::Pc, ResourceGroup::Laptop, ResourceGroup::Mobile];
}

impl fmt::Display for ResourceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResourceGroup::Pc => "PC",
            ResourceGroup::Laptop => "Laptop",
            ResourceGroup::Mobile => "Mobile",
        };
        f.pad(label)
    }
}

/// Static catalog entry. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    pub id: &'static str,
    pub name: &'static str,
    pub group: ResourceGroup,
}

const fn res(id: &'static str, name: &'static str, group: ResourceGroup) -> Resource {
    Resource { id, name, group }
}

pub const RESOURCES: &[Resource] = &[
    res("PC-1", "URANUS NM CLIENT", ResourceGroup::Pc),
    res("PC-2", "URANUS KMF CLIENT", ResourceGroup::Pc),
    res("PC-3", "URANUS DISPATCH", ResourceGroup::Pc),
    res("PC-4", "TYPE 2 NM CLIENT", ResourceGroup::Pc),
    res("PC-5", "TYPE 2 KMF CLIENT", ResourceGroup::Pc),
    res("PC-6", "TYPE 2 DISPATCH", ResourceGroup::Pc),
    res("Laptop-1", "FG Laptop 1", ResourceGroup::Laptop),
    res("Laptop-2", "FG Laptop 2", ResourceGroup::Laptop),
    res("Laptop-3", "FG Laptop 3", ResourceGroup::Laptop),
    res("Laptop-4", "FG Laptop 4", ResourceGroup::Laptop),
    res("Laptop-5", "FG Laptop 5", ResourceGroup::Laptop),
    res("MCH-Mobile", "Multi Control Head Mobile", ResourceGroup::Mobile),
];

pub fn lookup(id: &str) -> Option<&'static Resource> {
    RESOURCES.iter().find(|r| r.id == id)
}

pub fn by_group(group: ResourceGroup) -> impl Iterator<Item = &'static Resource> {
    RESOURCES.iter().filter(move |r| r.group == group)
}
