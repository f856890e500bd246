use std::io::{self, Read as _};
use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};

use insdb::catalog::{self, EditResult};
use insdb::config::{DEFAULT_CONFIG_FILE, InsdbConfig};
use insdb::edit::{self, ExternalEditor};
use insdb::error::DbError;
use insdb::format::OutputFormat;
use insdb::merge::MergeMode;
use insdb::model::Instruction;
use insdb::patch::Patch;
use insdb::store::Store;
use insdb::{prompt, render, telemetry};

/// Instruction database tool
///
/// Maintains the NASM instruction catalog: a single XML file holding one
/// <instruction> record per mnemonic, kept in alphabetical order.
///
/// QUICK START:
///
///   insdb list mov               # find records by name
///   insdb read mov               # show one record
///   insdb add nop CONTROL No operation
///   insdb edit mov               # opens $EDITOR on the record
///   insdb patch -m merge docs.xml
///
/// The database path comes from --db, then [database] path in insdb.toml,
/// then src/main/resources/nasm/instructions.xml.
#[derive(Parser)]
#[command(name = "insdb")]
#[command(version, about)]
#[command(disable_help_subcommand = true)]
#[command(
    after_help = "See 'insdb <command> --help' for more information on a specific command.\nSee 'insdb patch --help-patch' for the patch input format."
)]
struct Cli {
    /// Path to the instruction database
    #[arg(long, global = true, env = "INSDB_PATH", value_name = "PATH")]
    db: Option<PathBuf>,

    /// Path to the configuration file [default: insdb.toml]
    #[arg(long, global = true, env = "INSDB_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List instructions, optionally filtered by a name substring
    List {
        /// Case-insensitive substring of the name
        pattern: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a complete instruction entry
    Read {
        /// Instruction name (case-insensitive)
        name: String,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a simple instruction
    ///
    /// The name is stored lower-cased and the category upper-cased. The
    /// remaining words form the description.
    Add {
        name: String,
        category: String,
        #[arg(required = true, value_name = "DESCRIPTION")]
        description: Vec<String>,
    },

    /// Add an instruction with documentation and variants, interactively
    AddComplex {
        /// Instruction name (prompted when omitted)
        name: Option<String>,
        /// Category (prompted when omitted)
        category: Option<String>,
    },

    /// Edit an instruction in $EDITOR
    ///
    /// The record is written to a scratch file; save and close the editor
    /// to apply. If the edited XML does not parse, the scratch file is kept
    /// and its path printed.
    Edit {
        /// Instruction name (case-insensitive)
        name: String,
    },

    /// Delete an instruction
    Delete {
        /// Instruction name (case-insensitive)
        name: String,
    },

    /// Apply XML patches from a file or stdin
    Patch {
        /// Patch file, or '-' for stdin
        #[arg(default_value = "-")]
        file: String,

        /// Merge mode [default: [patch] mode in insdb.toml, else merge]
        #[arg(short, long, value_enum)]
        mode: Option<MergeMode>,

        /// Show detailed help for the patch input format
        #[arg(long)]
        help_patch: bool,
    },

    /// Print usage
    Help,
}

fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    let store = Store::new(config.database_path(cli.db.as_deref()));
    tracing::debug!(path = %store.path().display(), "using database");

    match cli.command {
        Commands::List { pattern, format } => list(&store, pattern.as_deref(), format),
        Commands::Read { name, format } => read(&store, &name, format),
        Commands::Add {
            name,
            category,
            description,
        } => add(
            &store,
            Instruction::simple(&name, &category, description.join(" ")),
        ),
        Commands::AddComplex { name, category } => {
            add_complex(&store, name.as_deref(), category.as_deref())
        }
        Commands::Edit { name } => edit(&store, &config, &name),
        Commands::Delete { name } => delete(&store, &name),
        Commands::Patch {
            file,
            mode,
            help_patch,
        } => {
            if help_patch {
                print!("{PATCH_HELP}");
                return Ok(());
            }
            patch(&store, &file, mode.unwrap_or(config.patch.mode))
        }
        Commands::Help => {
            Cli::command().print_long_help()?;
            Ok(())
        }
    }
}

fn load_config(explicit: Option<&PathBuf>) -> Result<InsdbConfig> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                bail!(
                    "config file not found: {}\n  To fix: check --config / INSDB_CONFIG, or remove it to use defaults.",
                    path.display()
                );
            }
            Ok(InsdbConfig::load(path)?)
        }
        None => Ok(InsdbConfig::load(&PathBuf::from(DEFAULT_CONFIG_FILE))?),
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn list(store: &Store, pattern: Option<&str>, format: OutputFormat) -> Result<()> {
    let doc = store.load()?;
    let entries = doc.list_by_pattern(pattern);
    print!("{}", format.render(&entries, |e| render::render_listing(e))?);
    Ok(())
}

fn read(store: &Store, name: &str, format: OutputFormat) -> Result<()> {
    let doc = store.load()?;
    if let Some(record) = doc.find_by_name(name) {
        print!("{}", format.render(record, render::render_record)?);
        return Ok(());
    }

    let similar = render::similar_names(&doc, name);
    if !similar.is_empty() {
        eprintln!("Similar instructions:");
        eprint!("{}", render::render_listing(&similar));
    }
    Err(DbError::RecordNotFound {
        name: name.to_owned(),
    }
    .into())
}

fn add(store: &Store, record: Instruction) -> Result<()> {
    let name = record.name.clone();
    let doc = catalog::add(store.load()?, record)?;
    store.save(&doc)?;
    println!("Successfully added instruction '{name}'");
    Ok(())
}

fn add_complex(store: &Store, name: Option<&str>, category: Option<&str>) -> Result<()> {
    let doc = store.load()?;
    if let Some(name) = name
        && doc.find_by_name(name).is_some()
    {
        return Err(DbError::DuplicateName {
            name: name.to_lowercase(),
        }
        .into());
    }

    let record = {
        let mut input = io::stdin().lock();
        let mut output = io::stdout().lock();
        prompt::collect_instruction(&mut input, &mut output, name, category)?
    };
    let name = record.name.clone();
    let doc = catalog::add(doc, record)?;
    store.save(&doc)?;
    println!("Successfully added instruction '{name}'");
    Ok(())
}

fn edit(store: &Store, config: &InsdbConfig, name: &str) -> Result<()> {
    let editor = ExternalEditor::resolve(config.editor.command.as_deref());
    let (doc, result) = edit::run_edit(store.load()?, name, &editor)?;
    match result {
        EditResult::Unchanged => {
            println!("No changes made to instruction '{}'", name.to_lowercase());
        }
        EditResult::Updated { name, renamed_from } => {
            store.save(&doc)?;
            match renamed_from {
                Some(old) => println!("Successfully updated instruction '{old}' (renamed to '{name}')"),
                None => println!("Successfully updated instruction '{name}'"),
            }
        }
    }
    Ok(())
}

fn delete(store: &Store, name: &str) -> Result<()> {
    let (doc, removed) = catalog::delete(store.load()?, name)?;
    store.save(&doc)?;
    println!("Successfully deleted instruction '{}'", removed.name);
    Ok(())
}

fn patch(store: &Store, file: &str, mode: MergeMode) -> Result<()> {
    let text = if file == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read patch from stdin")?;
        text
    } else {
        std::fs::read_to_string(file).with_context(|| format!("failed to read patch file '{file}'"))?
    };

    let patch = Patch::parse(&text)?;
    let (doc, outcomes) = catalog::apply_patch(store.load()?, &patch, mode);
    if outcomes.iter().any(|o| o.is_applied()) {
        store.save(&doc)?;
    }

    println!("Patch applied successfully ({mode} mode):");
    for outcome in &outcomes {
        println!("  {outcome}");
    }
    Ok(())
}

const PATCH_HELP: &str = r#"PATCH - apply XML to the instruction database

USAGE:
  insdb patch [-m MODE] [FILE]
  insdb patch [-m MODE] -          # read from stdin

OPTIONS:
  -m, --mode MODE   merge (default) or replace
                    merge:   update only what the patch supplies
                    replace: substitute the whole entry

INPUT:
  A single <instruction> element, or several wrapped in <instructions>.
  Records without a name attribute are skipped with a warning.

INSTRUCTION FORMAT:

  <instruction name="NAME" category="CATEGORY">
    <description>Short description</description>

    <!-- optional -->
    <documentation>
      <summary>Summary</summary>
      <description>Detailed description</description>
      <operation>Pseudocode, e.g. DEST := SRC</operation>
      <flags-affected>OF, SF, ZF, CF</flags-affected>
      <notes>Notes</notes>
    </documentation>

    <!-- optional -->
    <variants>
      <variant>
        <operand type="REG" />
        <operand type="R_M" />
      </variant>
      <variant>
        <operand type="R_M" />
        <operand type="IMM" optional="true" />
      </variant>
    </variants>
  </instruction>

  name      required; stored lower-cased
  category  e.g. ARITHMETIC, LOGICAL, DATA_TRANSFER, CONTROL, SYSTEM,
            FLOATING_POINT, SIMD, CRYPTO
  operand   REG, R_M, IMM, MEM, LABEL, IMM8..IMM64, REG8..REG64, SREG, ...

MERGE:
  Attributes in the patch overwrite existing ones. Each text field the
  patch supplies (description, summary, operation, ...) replaces the
  stored text; fields it leaves out are kept. <documentation> is merged
  field by field. <variants> is replaced as a whole when supplied.
  Any other child element replaces the stored one with the same tag.

REPLACE:
  The stored entry is discarded and the patch entry takes its place.

EXAMPLES:

  Add a record from stdin:
    echo '<instruction name="nop" category="CONTROL">
      <description>No operation</description>
    </instruction>' | insdb patch -

  Add a note to an existing record:
    insdb patch -m merge - <<EOF
    <instruction name="add">
      <documentation><notes>Sets CF on unsigned overflow</notes></documentation>
    </instruction>
    EOF

  Several records at once:
    insdb patch - <<EOF
    <instructions>
      <instruction name="push" category="CONTROL"><description>Push onto stack</description></instruction>
      <instruction name="pop" category="CONTROL"><description>Pop from stack</description></instruction>
    </instructions>
    EOF

  Replace an entry wholesale:
    insdb patch -m replace syscall.xml
"#;
