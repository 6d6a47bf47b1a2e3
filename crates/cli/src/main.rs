use clap::{Parser, Subcommand};
use laudo_core::{
    apply_defaults, narrative, validate, CaseLibrary, CoreConfig, DraftStore, ReportDraft,
    StudyTemplate, TemplateRegistry,
};
use laudo_export::{export_filename, ExportAdapter};
use laudo_types::{DraftKey, TemplateKey};

#[derive(Parser)]
#[command(name = "laudo")]
#[command(about = "Laudo structured radiology reporting CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered study templates
    Templates,
    /// Print the free-text skeleton of a template
    Skeleton {
        /// Template key, e.g. "Chest CT"
        template: String,
    },
    /// Print a fresh default record for a template as JSON
    New {
        /// Template key, e.g. "Chest CT"
        template: String,
    },
    /// List the case presets of a template
    Cases {
        /// Template key, e.g. "Chest CT"
        template: String,
    },
    /// Validate a draft file and print its issue list
    Validate {
        /// Path to a report draft JSON file
        file: String,
        /// Template key; defaults to the draft's studyArea
        #[arg(long)]
        template: Option<String>,
    },
    /// Print the narrative text of a draft file
    Render {
        /// Path to a report draft JSON file
        file: String,
        /// Template key; defaults to the draft's studyArea
        #[arg(long)]
        template: Option<String>,
    },
    /// Export a draft file to PDF
    Export {
        /// Path to a report draft JSON file
        file: String,
        /// Template key; defaults to the draft's studyArea
        #[arg(long)]
        template: Option<String>,
        /// Output path; defaults to a name derived from the patient id
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print the stored draft slot of a template
    ShowDraft {
        /// Template key, e.g. "Chest CT"
        template: String,
    },
    /// Clear the stored draft slot of a template
    ClearDraft {
        /// Template key, e.g. "Chest CT"
        template: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = CoreConfig::from_env_values(
        std::env::var("LAUDO_DATA_DIR").ok(),
        std::env::var("LAUDO_DRAFT_DIR").ok(),
    )?;
    let registry = TemplateRegistry::builtin();

    match cli.command {
        Some(Commands::Templates) => {
            for key in registry.list_templates() {
                println!("{key}");
            }
        }
        Some(Commands::Skeleton { template }) => {
            match registry.get(&TemplateKey::new(&template)) {
                Ok(found) => println!("{}", found.skeleton()),
                Err(e) => eprintln!("Error: {e}"),
            }
        }
        Some(Commands::New { template }) => {
            match registry.get_default(&TemplateKey::new(&template)) {
                Ok(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                Err(e) => eprintln!("Error: {e}"),
            }
        }
        Some(Commands::Cases { template }) => {
            let key = TemplateKey::new(&template);
            match registry.get(&key) {
                Ok(_) => {
                    let library = CaseLibrary::builtin();
                    let cases = library.cases_for(&key);
                    if cases.is_empty() {
                        println!("No case presets for {template}.");
                    } else {
                        for case in cases {
                            println!("{}", case.name());
                        }
                    }
                }
                Err(e) => eprintln!("Error: {e}"),
            }
        }
        Some(Commands::Validate { file, template }) => {
            let draft = read_draft(&file)?;
            match resolve_template(&registry, template, &draft) {
                Ok(found) => match validate(draft, found) {
                    Ok(_) => println!("Record is complete."),
                    Err(errors) => {
                        for issue in errors.issues() {
                            println!("{issue}");
                        }
                        std::process::exit(1);
                    }
                },
                Err(e) => eprintln!("Error: {e}"),
            }
        }
        Some(Commands::Render { file, template }) => {
            let draft = read_draft(&file)?;
            match resolve_template(&registry, template, &draft) {
                Ok(found) => {
                    let record = apply_defaults(draft, found);
                    println!("{}", narrative::render(&record));
                }
                Err(e) => eprintln!("Error: {e}"),
            }
        }
        Some(Commands::Export {
            file,
            template,
            output,
        }) => {
            let draft = read_draft(&file)?;
            match resolve_template(&registry, template, &draft) {
                Ok(found) => {
                    let record = apply_defaults(draft, found);
                    match ExportAdapter::default().export(&record) {
                        Ok(bytes) => {
                            let out = output.unwrap_or_else(|| export_filename(&record));
                            std::fs::write(&out, &bytes)?;
                            println!("Wrote {} ({} bytes)", out, bytes.len());
                        }
                        Err(e) => eprintln!("Error exporting report: {e}"),
                    }
                }
                Err(e) => eprintln!("Error: {e}"),
            }
        }
        Some(Commands::ShowDraft { template }) => {
            let store = DraftStore::in_dir(config.draft_dir());
            let key = DraftKey::for_template(&TemplateKey::new(&template));
            if store.contains(&key) {
                let draft = store.load(&key, ReportDraft::default());
                println!("{}", serde_json::to_string_pretty(&draft)?);
            } else {
                println!("No draft stored for {template}.");
            }
        }
        Some(Commands::ClearDraft { template }) => {
            let store = DraftStore::in_dir(config.draft_dir());
            store.clear(&DraftKey::for_template(&TemplateKey::new(&template)));
            println!("Cleared draft slot for {template}.");
        }
        None => {
            println!("Use 'laudo --help' for commands");
        }
    }

    Ok(())
}

fn read_draft(path: &str) -> Result<ReportDraft, Box<dyn std::error::Error>> {
    let body = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&body)?)
}

fn resolve_template<'r>(
    registry: &'r TemplateRegistry,
    explicit: Option<String>,
    draft: &ReportDraft,
) -> Result<&'r StudyTemplate, Box<dyn std::error::Error>> {
    let key = explicit
        .or_else(|| draft.study_area.clone())
        .filter(|name| !name.trim().is_empty())
        .ok_or("Draft does not name a studyArea; pass --template")?;
    Ok(registry.get(&TemplateKey::new(key))?)
}
