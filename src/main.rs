use clap::Parser;

pub mod cloudformation;
pub mod config;
pub mod ec2;
pub mod logger;
pub mod template;
pub mod vpc;
pub mod writer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = config::Args::parse();
    logger::init_cli_logger(args.verbose);

    // Nothing is written until every entry has been rendered (and validated).
    let entries = args.entries()?;
    let mut pending = Vec::with_capacity(entries.len());
    for config_entry in &entries {
        let environment = config_entry.environment()?;
        let format = config_entry.format.unwrap_or_default();
        let template = vpc::generate_template(&environment)?;
        pending.push(writer::PendingTemplate {
            contents: writer::render(&template, format)?,
            environment,
            format,
            output_dir: config_entry
                .output_dir
                .clone()
                .unwrap_or_else(|| std::path::PathBuf::from(".")),
        });
    }

    if args.validate {
        for (config_entry, template) in entries.iter().zip(&pending) {
            let validator =
                cloudformation::TemplateValidator::new(config_entry.region.as_deref()).await?;
            let description = validator.validate(&template.contents).await?;
            tracing::info!(
                environment = %template.environment,
                region = %validator.region,
                description = description.as_deref().unwrap_or_default(),
                "template validated"
            );
        }
    }

    for template in &pending {
        let path = template.write()?;
        tracing::info!(environment = %template.environment, path = %path.display(), "template written");
    }

    return Ok(());
}
