//! Property and association path references.
//!
//! A reference names its own slot and, optionally, the reference it was
//! reached through. `person.employer.address.city` becomes
//!
//! ```text
//! Property(Address:city)
//!   └─ traversed Property(Company:address)
//!        └─ traversed Association(Person:employer)
//! ```
//!
//! Chains are owned boxes, so they are finite; the compiler still bounds
//! their length against the configured maximum path depth.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::qualified_name::QualifiedName;

/// Whether an association holds one reference or a set of references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssociationKind {
    Single,
    Many,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssociationReference {
    pub name: QualifiedName,
    pub kind: AssociationKind,
    pub traversed: Option<Box<AssociationReference>>,
}

/// What a property was reached through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyTraversal {
    Association(Box<AssociationReference>),
    /// The parent is a value-composite property; this one is its sub-property
    Property(Box<PropertyReference>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyReference {
    pub name: QualifiedName,
    pub traversed: Option<PropertyTraversal>,
}

impl AssociationReference {
    pub fn single(name: QualifiedName) -> Self {
        AssociationReference {
            name,
            kind: AssociationKind::Single,
            traversed: None,
        }
    }

    pub fn many(name: QualifiedName) -> Self {
        AssociationReference {
            name,
            kind: AssociationKind::Many,
            traversed: None,
        }
    }

    /// Reach this association through `previous`.
    pub fn through(mut self, previous: AssociationReference) -> Self {
        self.traversed = Some(Box::new(previous));
        self
    }

    /// Hops from the root entity to this association, root first.
    pub fn chain(&self) -> Vec<&AssociationReference> {
        let mut hops = vec![self];
        let mut current = self;
        while let Some(previous) = current.traversed.as_deref() {
            hops.push(previous);
            current = previous;
        }
        hops.reverse();
        hops
    }
}

impl PropertyReference {
    pub fn new(name: QualifiedName) -> Self {
        PropertyReference {
            name,
            traversed: None,
        }
    }

    /// The identity pseudo-property of the root entity.
    pub fn identity() -> Self {
        PropertyReference::new(QualifiedName::identity())
    }

    pub fn through_association(mut self, association: AssociationReference) -> Self {
        self.traversed = Some(PropertyTraversal::Association(Box::new(association)));
        self
    }

    pub fn through_property(mut self, parent: PropertyReference) -> Self {
        self.traversed = Some(PropertyTraversal::Property(Box::new(parent)));
        self
    }

    /// Property hops from the outermost property down to this one, plus the
    /// association the outermost property was reached through, if any.
    pub fn chain(&self) -> (Vec<&PropertyReference>, Option<&AssociationReference>) {
        let mut hops = vec![self];
        let mut current = self;
        let mut association = None;
        while let Some(traversal) = current.traversed.as_ref() {
            match traversal {
                PropertyTraversal::Property(parent) => {
                    let parent = parent.as_ref();
                    hops.push(parent);
                    current = parent;
                }
                PropertyTraversal::Association(assoc) => {
                    association = Some(assoc.as_ref());
                    break;
                }
            }
        }
        hops.reverse();
        (hops, association)
    }
}

impl fmt::Display for AssociationReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(previous) = &self.traversed {
            write!(f, "{}.", previous)?;
        }
        write!(f, "{}", self.name.name)
    }
}

impl fmt::Display for PropertyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.traversed {
            Some(PropertyTraversal::Association(assoc)) => write!(f, "{}.", assoc)?,
            Some(PropertyTraversal::Property(parent)) => write!(f, "{}.", parent)?,
            None => {}
        }
        write!(f, "{}", self.name.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city_through_employer() -> PropertyReference {
        let employer = AssociationReference::single(QualifiedName::new("Person", "employer"));
        let address = PropertyReference::new(QualifiedName::new("Company", "address"))
            .through_association(employer);
        PropertyReference::new(QualifiedName::new("Address", "city")).through_property(address)
    }

    #[test]
    fn test_property_chain_order() {
        let city = city_through_employer();
        let (hops, association) = city.chain();
        let names: Vec<&str> = hops.iter().map(|p| p.name.name.as_str()).collect();
        assert_eq!(names, vec!["address", "city"]);
        assert_eq!(association.map(|a| a.name.name.as_str()), Some("employer"));
    }

    #[test]
    fn test_association_chain_order() {
        let friend = AssociationReference::single(QualifiedName::new("Person", "friend"));
        let pet = AssociationReference::many(QualifiedName::new("Person", "pets")).through(friend);
        let names: Vec<&str> = pet.chain().iter().map(|a| a.name.name.as_str()).collect();
        assert_eq!(names, vec!["friend", "pets"]);
    }

    #[test]
    fn test_display_path() {
        assert_eq!(city_through_employer().to_string(), "employer.address.city");
    }
}
