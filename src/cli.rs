use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::service::Dependency;

#[derive(Parser)]
#[clap(version, about)]
pub struct Cli {
    #[clap(
        long,
        default_value = "http://127.0.0.1:8000/composer/",
        help = "Base URL of the composer service"
    )]
    pub server: String,

    #[clap(long, help = "Django session id of an open composer session")]
    pub session_id: Option<String>,

    #[clap(long, help = "CSRF token sent with every POST")]
    pub csrf_token: Option<String>,

    #[clap(long, default_value_t = 30, help = "Request timeout in seconds")]
    pub timeout: u64,

    #[clap(
        long,
        help = "Read the schema from this file instead of downloading the composed one"
    )]
    pub schema: Option<PathBuf>,

    #[clap(long, help = "Allow a XML Document Type Definition (DTD) to occur")]
    pub allow_dtd: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the schema tree with the XPath of every node
    Show,
    /// Insert an element of the given type into a sequence
    Insert {
        #[clap(long, help = "XPath of the sequence")]
        target: String,
        #[clap(long, default_value = "built_in_type")]
        type_id: String,
        #[clap(long)]
        type_name: String,
    },
    /// Delete an element
    Delete {
        #[clap(long)]
        target: String,
    },
    /// Rename an element
    Rename {
        #[clap(long)]
        target: String,
        #[clap(long)]
        name: String,
    },
    /// Change the type of an element
    Retype {
        #[clap(long)]
        target: String,
        #[clap(long = "type")]
        new_type: String,
    },
    /// Show the occurrences of an element, or set them when bounds are given
    Occurrences {
        #[clap(long)]
        target: String,
        #[clap(long, requires = "max")]
        min: Option<String>,
        #[clap(long, requires = "min")]
        max: Option<String>,
    },
    /// Save the composed schema as a template
    SaveTemplate {
        #[clap(long)]
        name: String,
    },
    /// Save the composed schema as a type
    SaveType {
        #[clap(long)]
        name: String,
        #[clap(long, default_value = "new")]
        template_id: String,
    },
    /// Rename the single root type of a new template
    RenameRootType {
        #[clap(long)]
        name: String,
    },
    /// Delete a bucket of types
    DeleteBucket {
        #[clap(long)]
        id: String,
    },
    /// Upload a type, pointing its imports and includes at existing types
    ResolveDependencies {
        #[clap(long, help = "The XSD file to upload")]
        xsd: PathBuf,
        #[clap(long, default_value = "", help = "Title of the new type")]
        name: String,
        #[clap(long, help = "File name stored with the type [default: name of the XSD file]")]
        filename: Option<String>,
        #[clap(long, help = "Add a version to this type instead of creating a new one")]
        version_manager_id: Option<String>,
        #[clap(
            long = "dependency",
            value_parser = parse_dependency,
            help = "LOCATION=TYPE_ID, once per import or include"
        )]
        dependencies: Vec<Dependency>,
        #[clap(long = "bucket")]
        buckets: Vec<String>,
    },
}

impl Command {
    /// Bucket and type administration does not touch the composed schema.
    pub fn needs_schema(&self) -> bool {
        !matches!(
            self,
            Self::DeleteBucket { .. } | Self::ResolveDependencies { .. }
        )
    }
}

fn parse_dependency(source: &str) -> Result<Dependency, String> {
    let (schema_location, type_id) = source
        .split_once('=')
        .ok_or_else(|| format!("expected LOCATION=TYPE_ID, got {source:?}"))?;
    Ok(Dependency {
        schema_location: schema_location.into(),
        type_id: type_id.into(),
    })
}
