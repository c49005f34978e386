use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::ec2::Resource;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Logical id {0} is already used in the template")]
    DuplicateLogicalId(String),

    #[error("{from} references {to}, which is not declared in the template")]
    DanglingReference { from: String, to: String },
}

/// Typed pointer to a resource already declared in a [`Template`].
///
/// `K` is the property type of the target, so an attachment cannot be handed a
/// VPC where it expects a gateway. Only [`Template::add_resource`] hands these
/// out, so a `Ref` always names a logical id that existed when it was issued.
pub struct Ref<K> {
    logical_id: String,
    kind: PhantomData<K>,
}

impl<K> Ref<K> {
    fn new(logical_id: String) -> Self {
        Self {
            logical_id,
            kind: PhantomData,
        }
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }
}

impl<K> Clone for Ref<K> {
    fn clone(&self) -> Self {
        Self::new(self.logical_id.clone())
    }
}

impl<K> PartialEq for Ref<K> {
    fn eq(&self, other: &Self) -> bool {
        self.logical_id == other.logical_id
    }
}

impl<K> Eq for Ref<K> {}

impl<K> fmt::Debug for Ref<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&self.logical_id).finish()
    }
}

impl<K> Serialize for Ref<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("Ref", &self.logical_id)?;
        map.end()
    }
}

/// Resource tags, rendered as a key-sorted list of `{"Key", "Value"}` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    /// `Environment` and `Name` tags, with the name prefixed by the environment.
    pub fn for_environment(environment: &str, name_suffix: &str) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert(String::from("Environment"), environment.to_string());
        tags.insert(
            String::from("Name"),
            format!("{}-{}", environment, name_suffix),
        );
        Self(tags)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl Serialize for Tags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct Tag<'a> {
            key: &'a str,
            value: &'a str,
        }

        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            seq.serialize_element(&Tag { key, value })?;
        }
        seq.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Metadata {
    pub depends_on: Vec<String>,
    pub environment: String,
    pub stack_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub value: Ref<Resource>,
}

impl Output {
    pub fn new<K>(value: Ref<K>) -> Self {
        Self {
            value: Ref::new(value.logical_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    description: String,
    metadata: Metadata,
    resources: BTreeMap<String, Resource>,
    outputs: BTreeMap<String, Output>,
}

impl Template {
    pub fn new(description: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            description: description.into(),
            metadata,
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn add_resource<K: Into<Resource>>(
        &mut self,
        logical_id: impl Into<String>,
        resource: K,
    ) -> Result<Ref<K>, Error> {
        let logical_id = logical_id.into();
        let resource = resource.into();
        if self.resources.contains_key(&logical_id) {
            return Err(Error::DuplicateLogicalId(logical_id));
        }
        for target in resource.references() {
            self.ensure_declared(&logical_id, target)?;
        }

        tracing::debug!(%logical_id, kind = resource.type_name(), "adding resource");
        self.resources.insert(logical_id.clone(), resource);

        return Ok(Ref::new(logical_id));
    }

    pub fn add_output(&mut self, logical_id: impl Into<String>, output: Output) -> Result<(), Error> {
        let logical_id = logical_id.into();
        if self.outputs.contains_key(&logical_id) {
            return Err(Error::DuplicateLogicalId(logical_id));
        }
        self.ensure_declared(&logical_id, output.value.logical_id())?;

        tracing::debug!(%logical_id, value = output.value.logical_id(), "adding output");
        self.outputs.insert(logical_id, output);

        return Ok(());
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    pub fn output(&self, logical_id: &str) -> Option<&Output> {
        self.outputs.get(logical_id)
    }

    pub fn resource_ids(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn output_ids(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(String::as_str)
    }

    fn ensure_declared(&self, from: &str, target: &str) -> Result<(), Error> {
        if !self.resources.contains_key(target) {
            return Err(Error::DanglingReference {
                from: from.to_string(),
                to: target.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, Metadata, Output, Tags, Template};
    use crate::ec2::{InternetGateway, Resource, Vpc, VpcGatewayAttachment};

    fn empty_template() -> Template {
        Template::new(
            "Test",
            Metadata {
                depends_on: vec![],
                environment: String::from("Test"),
                stack_name: String::from("Test-VPC"),
            },
        )
    }

    fn gateway() -> InternetGateway {
        InternetGateway {
            tags: Tags::for_environment("Test", "InternetGateway"),
        }
    }

    fn vpc() -> Vpc {
        Vpc {
            cidr_block: String::from("10.0.0.0/16"),
            enable_dns_hostnames: true,
            enable_dns_support: true,
            instance_tenancy: String::from("default"),
            tags: Tags::for_environment("Test", "ServiceVPC"),
        }
    }

    #[test]
    fn name_tag_is_prefixed_with_environment() {
        let tags = Tags::for_environment("Staging", "NetworkAcl");
        assert_eq!(Some("Staging"), tags.get("Environment"));
        assert_eq!(Some("Staging-NetworkAcl"), tags.get("Name"));
        assert_eq!(None, tags.get("Owner"));
    }

    #[test]
    fn tags_serialize_as_sorted_key_value_list() {
        let tags = Tags::for_environment("Staging", "NetworkAcl");
        let value = serde_json::to_value(&tags).unwrap();
        assert_eq!(
            serde_json::json!([
                {"Key": "Environment", "Value": "Staging"},
                {"Key": "Name", "Value": "Staging-NetworkAcl"}
            ]),
            value
        );
    }

    #[test]
    fn ref_serializes_as_intrinsic() {
        let mut template = empty_template();
        let gateway_ref = template.add_resource("Gateway", gateway()).unwrap();
        assert_eq!(
            serde_json::json!({"Ref": "Gateway"}),
            serde_json::to_value(&gateway_ref).unwrap()
        );
    }

    #[test]
    fn typed_refs_wire_up_an_attachment() {
        let mut template = empty_template();
        let gateway_ref = template.add_resource("Gateway", gateway()).unwrap();
        let vpc_ref = template.add_resource("Network", vpc()).unwrap();

        template
            .add_resource(
                "Attachment",
                VpcGatewayAttachment {
                    internet_gateway_id: gateway_ref,
                    vpc_id: vpc_ref,
                },
            )
            .unwrap();

        match template.resource("Attachment") {
            Some(Resource::VpcGatewayAttachment(attachment)) => {
                assert_eq!("Gateway", attachment.internet_gateway_id.logical_id());
                assert_eq!("Network", attachment.vpc_id.logical_id());
            }
            other => panic!("Expected a gateway attachment, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_resource_id_is_rejected() {
        let mut template = empty_template();
        template.add_resource("Gateway", gateway()).unwrap();

        let result = template.add_resource("Gateway", gateway());
        assert_eq!(
            Err(Error::DuplicateLogicalId(String::from("Gateway"))),
            result.map(|_| ())
        );
    }

    #[test]
    fn output_may_share_resource_id() {
        let mut template = empty_template();
        let gateway_ref = template.add_resource("Gateway", gateway()).unwrap();

        template
            .add_output("Gateway", Output::new(gateway_ref))
            .unwrap();
        assert_eq!(
            "Gateway",
            template.output("Gateway").unwrap().value.logical_id()
        );
        assert!(template.resource("Gateway").is_some());
    }

    #[test]
    fn duplicate_output_id_is_rejected() {
        let mut template = empty_template();
        let gateway_ref = template.add_resource("Gateway", gateway()).unwrap();
        template
            .add_output("GatewayId", Output::new(gateway_ref.clone()))
            .unwrap();

        let result = template.add_output("GatewayId", Output::new(gateway_ref));
        assert_eq!(
            Err(Error::DuplicateLogicalId(String::from("GatewayId"))),
            result
        );
    }

    #[test]
    fn reference_into_another_template_is_dangling() {
        let mut other = empty_template();
        let foreign_gateway = other.add_resource("ForeignGateway", gateway()).unwrap();
        let foreign_vpc = other.add_resource("ForeignVpc", vpc()).unwrap();

        let mut template = empty_template();
        let result = template.add_resource(
            "Attachment",
            VpcGatewayAttachment {
                internet_gateway_id: foreign_gateway,
                vpc_id: foreign_vpc,
            },
        );
        assert_eq!(
            Err(Error::DanglingReference {
                from: String::from("Attachment"),
                to: String::from("ForeignGateway"),
            }),
            result.map(|_| ())
        );
        assert_eq!(0, template.resource_ids().count());
    }

    #[test]
    fn dangling_output_is_rejected() {
        let mut other = empty_template();
        let foreign = other.add_resource("Gateway", gateway()).unwrap();

        let mut template = empty_template();
        let result = template.add_output("GatewayId", Output::new(foreign));
        match result {
            Err(Error::DanglingReference { .. }) => {}
            _ => panic!("Expected `DanglingReference` error"),
        }
    }
}
