// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic ordering of a [`CompileUnit`] before rendering.
//!
//! Namespaces, imports and top-level types are sorted by name and every
//! attribute list in the tree is sorted. Member order is left alone: the
//! generators already emit members in a stable, name-driven order, and
//! overload pairs must stay adjacent.

use crate::code_model::{AttributeDecl, CompileUnit, Member, TypeDecl};
use std::cmp::Ordering;

/// Sorts `unit` in place. Idempotent.
pub fn order_compile_unit(unit: &mut CompileUnit) {
    unit.namespaces.sort_by(|a, b| a.name.cmp(&b.name));
    for ns in &mut unit.namespaces {
        ns.imports.sort();
        ns.imports.dedup();
        ns.types.sort_by(|a, b| a.name.cmp(&b.name));
        for ty in &mut ns.types {
            order_type(ty);
        }
    }
}

fn order_type(ty: &mut TypeDecl) {
    sort_attributes(&mut ty.attributes);
    for member in &mut ty.members {
        match member {
            Member::Property(p) => sort_attributes(&mut p.attributes),
            Member::Method(m) => {
                sort_attributes(&mut m.attributes);
                for param in &mut m.params {
                    sort_attributes(&mut param.attributes);
                }
            }
            Member::Constructor(c) => {
                for param in &mut c.params {
                    sort_attributes(&mut param.attributes);
                }
            }
            Member::EnumMember(e) => sort_attributes(&mut e.attributes),
            Member::Field(_) => {}
        }
    }
    for nested in &mut ty.nested_types {
        order_type(nested);
    }
}

// Stable: attributes with the same name keep their generation order.
fn sort_attributes(attributes: &mut [AttributeDecl]) {
    attributes.sort_by(compare_attributes);
}

fn compare_attributes(a: &AttributeDecl, b: &AttributeDecl) -> Ordering {
    a.name.cmp(&b.name).then_with(|| a.args.len().cmp(&b.args.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_model::{CodeNamespace, Expr};

    fn unit() -> CompileUnit {
        let mut order = TypeDecl::class("Order");
        order.attributes = vec![
            AttributeDecl::new("DataContract"),
            AttributeDecl::new("Bindable").arg(Expr::Bool(true)),
        ];
        let mut ns = CodeNamespace::new("Zeta");
        ns.imports = vec!["System.Linq".into(), "System".into(), "System.Linq".into()];
        ns.types = vec![order, TypeDecl::class("Customer")];
        CompileUnit {
            namespaces: vec![ns, CodeNamespace::new("Alpha")],
        }
    }

    #[test]
    fn sorts_namespaces_imports_types_and_attributes() {
        let mut u = unit();
        order_compile_unit(&mut u);
        assert_eq!(u.namespaces[0].name, "Alpha");
        let zeta = &u.namespaces[1];
        assert_eq!(zeta.imports, vec!["System", "System.Linq"]);
        let names: Vec<_> = zeta.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Customer", "Order"]);
        let attrs: Vec<_> = zeta.types[1].attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(attrs, vec!["Bindable", "DataContract"]);
    }

    #[test]
    fn ordering_is_idempotent() {
        let mut once = unit();
        order_compile_unit(&mut once);
        let mut twice = once.clone();
        order_compile_unit(&mut twice);
        assert_eq!(once, twice);
    }
}
