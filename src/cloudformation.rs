use aws_config::meta::region::RegionProviderChain;
use aws_types::region::Region;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Service error ocurred: {0}.")]
    ServiceError(String),

    #[error("Unknown error ocurred: {0}.")]
    UnknownError(String),

    #[error("No AWS region configured")]
    RegionNotFound,
}

/// Checks rendered templates against CloudFormation's `ValidateTemplate` API.
pub struct TemplateValidator {
    pub region: String,

    client: aws_sdk_cloudformation::Client,
}

impl TemplateValidator {
    pub async fn new(region: Option<&str>) -> Result<Self, Error> {
        let region = match region {
            Some(provided_region) => Region::new(provided_region.to_string()),
            None => match RegionProviderChain::default_provider().region().await {
                Some(region) => region,
                None => return Err(Error::RegionNotFound),
            },
        };

        let region_for_config = region.clone();
        let sdk_config = aws_config::from_env()
            .region(region_for_config)
            .load()
            .await;
        let client = aws_sdk_cloudformation::Client::new(&sdk_config);

        return Ok(Self {
            region: region.to_string(),
            client,
        });
    }

    /// Returns the description CloudFormation reports for the template body.
    pub async fn validate(&self, template_body: &str) -> Result<Option<String>, Error> {
        let result = self
            .client
            .validate_template()
            .template_body(template_body)
            .send()
            .await;

        let result = match result {
            Ok(data) => data,
            Err(aws_sdk_cloudformation::types::SdkError::ServiceError { err, .. }) => {
                return Err(Error::ServiceError(err.to_string()));
            }
            Err(err) => return Err(Error::UnknownError(err.to_string())),
        };

        tracing::debug!(
            region = %self.region,
            parameters = result.parameters().map(|p| p.len()).unwrap_or(0),
            "template accepted by CloudFormation"
        );
        return Ok(result.description().map(String::from));
    }
}
