// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Naming conventions of the generated client surface.

/// `OrderService` -> `OrderContext`, `Orders` -> `OrdersContext`.
pub(super) fn context_name(service_name: &str) -> String {
    let stem = service_name
        .strip_suffix("DomainService")
        .or_else(|| service_name.strip_suffix("Service"))
        .filter(|s| !s.is_empty())
        .unwrap_or(service_name);
    format!("{stem}Context")
}

/// `IOrderServiceContract`.
pub(super) fn contract_name(service_name: &str) -> String {
    format!("I{service_name}Contract")
}

/// Relative service address: `Northwind.Services.OrderService` ->
/// `Northwind-Services-OrderService.svc`.
pub(super) fn service_uri(service_full_name: &str) -> String {
    format!("{}.svc", service_full_name.replace('.', "-"))
}

/// Default data contract namespace for a CLR namespace.
pub(super) fn data_contract_namespace(clr_namespace: &str) -> String {
    format!("http://schemas.datacontract.org/2004/07/{clr_namespace}")
}

/// SOAP action of an operation.
pub(super) fn operation_action(service_name: &str, operation: &str) -> String {
    format!("http://tempuri.org/{service_name}/{operation}")
}

/// Backing field: `CustomerId` -> `_customerId`.
pub(super) fn field_name(property: &str) -> String {
    let mut chars = property.chars();
    chars.next().map_or_else(String::new, |first| {
        format!("_{}{}", first.to_lowercase(), chars.as_str())
    })
}

/// English plural used for entity set properties.
pub(super) fn pluralize(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    let ends_with_consonant_y = lower.ends_with('y')
        && lower
            .chars()
            .rev()
            .nth(1)
            .is_some_and(|c| !"aeiou".contains(c));
    if ends_with_consonant_y {
        format!("{}ies", &name[..name.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        format!("{name}es")
    } else {
        format!("{name}s")
    }
}
