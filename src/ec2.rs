//! EC2 networking resources that can be declared in a [`Template`](crate::template::Template).

use serde::Serialize;

use crate::template::{Ref, Tags};

pub const TCP: u8 = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "Type", content = "Properties")]
pub enum Resource {
    #[serde(rename = "AWS::EC2::InternetGateway")]
    InternetGateway(InternetGateway),

    #[serde(rename = "AWS::EC2::VPC")]
    Vpc(Vpc),

    #[serde(rename = "AWS::EC2::VPCGatewayAttachment")]
    VpcGatewayAttachment(VpcGatewayAttachment),

    #[serde(rename = "AWS::EC2::NetworkAcl")]
    NetworkAcl(NetworkAcl),

    #[serde(rename = "AWS::EC2::NetworkAclEntry")]
    NetworkAclEntry(NetworkAclEntry),
}

impl Resource {
    pub fn type_name(&self) -> &'static str {
        match self {
            Resource::InternetGateway(_) => "AWS::EC2::InternetGateway",
            Resource::Vpc(_) => "AWS::EC2::VPC",
            Resource::VpcGatewayAttachment(_) => "AWS::EC2::VPCGatewayAttachment",
            Resource::NetworkAcl(_) => "AWS::EC2::NetworkAcl",
            Resource::NetworkAclEntry(_) => "AWS::EC2::NetworkAclEntry",
        }
    }

    /// Logical ids of every other resource this one points at.
    pub fn references(&self) -> Vec<&str> {
        match self {
            Resource::InternetGateway(_) | Resource::Vpc(_) => vec![],
            Resource::VpcGatewayAttachment(attachment) => vec![
                attachment.internet_gateway_id.logical_id(),
                attachment.vpc_id.logical_id(),
            ],
            Resource::NetworkAcl(acl) => vec![acl.vpc_id.logical_id()],
            Resource::NetworkAclEntry(entry) => vec![entry.network_acl_id.logical_id()],
        }
    }

    pub fn tags(&self) -> Option<&Tags> {
        match self {
            Resource::InternetGateway(gateway) => Some(&gateway.tags),
            Resource::Vpc(vpc) => Some(&vpc.tags),
            Resource::NetworkAcl(acl) => Some(&acl.tags),
            Resource::VpcGatewayAttachment(_) | Resource::NetworkAclEntry(_) => None,
        }
    }
}

macro_rules! into_resource {
    ($($kind:ident),+) => {
        $(
            impl From<$kind> for Resource {
                fn from(properties: $kind) -> Self {
                    Resource::$kind(properties)
                }
            }
        )+
    };
}

into_resource!(InternetGateway, Vpc, VpcGatewayAttachment, NetworkAcl, NetworkAclEntry);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InternetGateway {
    pub tags: Tags,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vpc {
    pub cidr_block: String,
    pub enable_dns_hostnames: bool,
    pub enable_dns_support: bool,
    pub instance_tenancy: String,
    pub tags: Tags,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcGatewayAttachment {
    pub internet_gateway_id: Ref<InternetGateway>,
    pub vpc_id: Ref<Vpc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkAcl {
    pub vpc_id: Ref<Vpc>,
    pub tags: Tags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortRange {
    pub from: u16,
    pub to: u16,
}

impl PortRange {
    pub fn single(port: u16) -> Self {
        Self {
            from: port,
            to: port,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkAclEntry {
    pub cidr_block: String,
    pub egress: bool,
    pub network_acl_id: Ref<NetworkAcl>,

    // No port range means every port of the protocol.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_range: Option<PortRange>,

    pub protocol: u8,
    pub rule_action: RuleAction,
    pub rule_number: u16,
}
