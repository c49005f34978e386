//! The Service VPC: an internet gateway attached to a `10.0.0.0/16` network whose
//! network ACL lets HTTPS in and all TCP out.

use crate::config::Environment;
use crate::ec2::{
    InternetGateway, NetworkAcl, NetworkAclEntry, PortRange, RuleAction, Vpc,
    VpcGatewayAttachment, TCP,
};
use crate::template::{Error, Metadata, Output, Tags, Template};

pub const DESCRIPTION: &str = "Service VPC";
pub const VPC_CIDR_BLOCK: &str = "10.0.0.0/16";
pub const ANY_CIDR_BLOCK: &str = "0.0.0.0/0";
pub const HTTPS_PORT: u16 = 443;
pub const INBOUND_RULE_NUMBER: u16 = 100;
pub const OUTBOUND_RULE_NUMBER: u16 = 200;

pub fn generate_template(environment: &Environment) -> Result<Template, Error> {
    let env = environment.as_str();
    let mut template = Template::new(
        DESCRIPTION,
        Metadata {
            depends_on: vec![],
            environment: env.to_string(),
            stack_name: environment.stack_name(),
        },
    );

    let internet_gateway = template.add_resource(
        "InternetGateway",
        InternetGateway {
            tags: Tags::for_environment(env, "InternetGateway"),
        },
    )?;

    let vpc = template.add_resource(
        "VPC",
        Vpc {
            cidr_block: String::from(VPC_CIDR_BLOCK),
            enable_dns_hostnames: true,
            enable_dns_support: true,
            instance_tenancy: String::from("default"),
            tags: Tags::for_environment(env, "ServiceVPC"),
        },
    )?;

    template.add_resource(
        "VpcGatewayAttachment",
        VpcGatewayAttachment {
            internet_gateway_id: internet_gateway.clone(),
            vpc_id: vpc.clone(),
        },
    )?;

    let network_acl = template.add_resource(
        "VpcNetworkAcl",
        NetworkAcl {
            vpc_id: vpc.clone(),
            tags: Tags::for_environment(env, "NetworkAcl"),
        },
    )?;

    template.add_resource(
        "VpcNetworkAclInboundRule",
        NetworkAclEntry {
            cidr_block: String::from(ANY_CIDR_BLOCK),
            egress: false,
            network_acl_id: network_acl.clone(),
            port_range: Some(PortRange::single(HTTPS_PORT)),
            protocol: TCP,
            rule_action: RuleAction::Allow,
            rule_number: INBOUND_RULE_NUMBER,
        },
    )?;

    template.add_resource(
        "VpcNetworkAclOutboundRule",
        NetworkAclEntry {
            cidr_block: String::from(ANY_CIDR_BLOCK),
            egress: true,
            network_acl_id: network_acl,
            port_range: None,
            protocol: TCP,
            rule_action: RuleAction::Allow,
            rule_number: OUTBOUND_RULE_NUMBER,
        },
    )?;

    template.add_output("InternetGateway", Output::new(internet_gateway))?;
    template.add_output("VPCID", Output::new(vpc))?;

    tracing::info!(environment = env, "generated Service VPC template");
    return Ok(template);
}
