// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Service contracts implemented by hosted proxies.

use ria_schema::{DomainOperation, DomainServiceDescription, ParameterMode, TypeRef, Visibility};
use serde::{Deserialize, Serialize};

/// One contract method parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractParameter {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Passing convention.
    #[serde(default)]
    pub mode: ParameterMode,
}

impl ContractParameter {
    /// A by-value parameter.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            mode: ParameterMode::In,
        }
    }

    /// An `out` parameter.
    pub fn out(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            mode: ParameterMode::Out,
            ..Self::new(name, ty)
        }
    }
}

/// One contract method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMethod {
    /// Method name; matched against operation names.
    pub name: String,
    /// Declared return type.
    #[serde(default = "void")]
    pub return_type: TypeRef,
    /// Ordered parameters.
    #[serde(default)]
    pub parameters: Vec<ContractParameter>,
}

fn void() -> TypeRef {
    TypeRef::Void
}

impl ContractMethod {
    /// A method with no parameters.
    pub fn new(name: impl Into<String>, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            return_type,
            parameters: Vec::new(),
        }
    }

    /// Appends a parameter.
    pub fn with_parameter(mut self, parameter: ContractParameter) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// An interface a proxy implements by forwarding to a DomainService.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceContract {
    /// Interface name.
    pub name: String,
    /// Declaring namespace.
    #[serde(default)]
    pub namespace: String,
    /// Accessibility of the interface.
    #[serde(default)]
    pub visibility: Visibility,
    /// Declared methods.
    #[serde(default)]
    pub methods: Vec<ContractMethod>,
}

impl ServiceContract {
    /// A public contract with no methods.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            visibility: Visibility::Public,
            methods: Vec::new(),
        }
    }

    /// Appends a method.
    pub fn with_method(mut self, method: ContractMethod) -> Self {
        self.methods.push(method);
        self
    }

    /// The contract mirroring every operation of `description`: queries and
    /// invokes keep their signatures, submit methods return nothing.
    pub fn from_description(description: &DomainServiceDescription) -> Self {
        let service = description.service_type();
        let mut contract = Self::new(service.namespace.clone(), format!("I{}", service.name));
        for entry in description.domain_operation_entries() {
            let return_type = match entry.operation {
                DomainOperation::Query | DomainOperation::Invoke => entry.return_type.clone(),
                _ => TypeRef::Void,
            };
            let mut method = ContractMethod::new(entry.name.clone(), return_type);
            method.parameters = entry
                .parameters
                .iter()
                .map(|p| ContractParameter {
                    name: p.name.clone(),
                    ty: p.ty.clone(),
                    mode: p.mode,
                })
                .collect();
            contract.methods.push(method);
        }
        contract
    }

    /// Namespace-qualified name.
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Whether the interface is public.
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Looks up a method by name.
    pub fn method(&self, name: &str) -> Option<&ContractMethod> {
        self.methods.iter().find(|m| m.name == name)
    }
}
