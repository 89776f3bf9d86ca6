use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use value_rules::config::{load_from_path, CompiledRuleSet, RuleOutcome, RuleSet};
use value_rules::logging::{init_logging, LogConfig};
use value_rules::rules::{expand_template, LengthPredicate, TokenizerConfig};
use value_rules::{AttributeFile, FsListLoader, PatternReplacer, Services, StdRegexEngine};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "value-rules")]
#[command(
    about = "Apply text-value transformation rules to extracted attributes",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply rulesets to a JSON attribute file
    Apply {
        /// Attribute file to transform
        input: PathBuf,

        /// Ruleset to apply (otherwise every ruleset in rules/, in name order)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Write the result here instead of replacing the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show what would change without writing anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show a diff of every changed value
        #[arg(short, long)]
        diff: bool,
    },

    /// Load and validate rulesets without applying them
    Check {
        /// Ruleset files (otherwise every ruleset in rules/)
        paths: Vec<PathBuf>,
    },

    /// List available rulesets
    List {
        /// Directory to search
        #[arg(long, default_value = "rules")]
        dir: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show what a regex replacement expands to for the first match
    Preview {
        pattern: String,
        replacement: String,
        input: String,

        #[arg(short, long)]
        case_sensitive: bool,
    },

    /// Expand a tokenizer template against an input value
    Expand {
        template: String,
        input: String,

        #[arg(short, long, default_value_t = ',')]
        delimiter: char,

        /// Text placed between the tokens of a %N-%M range
        #[arg(short, long, default_value = "")]
        between: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_verbosity(cli.verbose));

    match cli.command {
        Commands::Apply {
            input,
            rules,
            output,
            dry_run,
            diff,
        } => cmd_apply(&input, rules, output, dry_run, diff),
        Commands::Check { paths } => cmd_check(paths),
        Commands::List { dir, json } => cmd_list(&dir, json),
        Commands::Preview {
            pattern,
            replacement,
            input,
            case_sensitive,
        } => cmd_preview(&pattern, &replacement, &input, case_sensitive),
        Commands::Expand {
            template,
            input,
            delimiter,
            between,
        } => cmd_expand(template, &input, delimiter, between),
    }
}

/// Every `.toml` file directly inside `dir`, sorted by name.
fn discover_rule_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("No ruleset directory at {}", dir.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
        {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No .toml rulesets found in {}", dir.display());
    }
    Ok(files)
}

fn rule_files(explicit: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    if explicit.is_empty() {
        discover_rule_files(Path::new("rules"))
    } else {
        Ok(explicit)
    }
}

/// Services whose list loader resolves relative list files next to the ruleset.
fn services_for(ruleset: &Path) -> Services {
    let base = ruleset.parent().unwrap_or_else(|| Path::new("."));
    Services::default().with_list_loader(Arc::new(FsListLoader::with_base_dir(base)))
}

fn display_diff(name: &str, before: &str, after: &str) {
    println!("{}", format!("--- {name} (before)").dimmed());
    println!("{}", format!("+++ {name} (after)").dimmed());

    let diff = TextDiff::from_lines(before, after);
    for change in diff.iter_all_changes() {
        let line = match change.tag() {
            ChangeTag::Delete => format!("-{change}").red(),
            ChangeTag::Insert => format!("+{change}").green(),
            ChangeTag::Equal => format!(" {change}").normal(),
        };
        print!("{line}");
        if change.missing_newline() {
            println!();
        }
    }
}

fn cmd_apply(
    input: &Path,
    rules: Option<PathBuf>,
    output: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
) -> Result<()> {
    let rule_files = rule_files(rules.into_iter().collect())?;
    let mut file = AttributeFile::read(input)?;

    println!("Input: {}", input.display());
    if dry_run {
        println!("{}", "[DRY RUN - nothing will be written]".cyan());
    }
    println!();

    let mut total_changed = 0;
    let mut total_unchanged = 0;
    let mut total_skipped = 0;
    let mut total_failed = 0;
    let mut aborted = false;

    for path in rule_files {
        let set = load_from_path(&path)?;
        let compiled = CompiledRuleSet::compile(&set, services_for(&path))
            .with_context(|| format!("compiling {}", path.display()))?;
        println!(
            "Applying {} ({} rules)...",
            display_name(&set, &path).bold(),
            compiled.rules().len()
        );

        let report = compiled.apply(&file.document, &mut file.attributes);
        for entry in &report.entries {
            match &entry.result {
                Ok(RuleOutcome::Changed { before, after }) => {
                    println!(
                        "{} {} on {}: {:?} -> {:?}",
                        "✓".green(),
                        entry.rule_id,
                        entry.attribute,
                        before,
                        after
                    );
                    if show_diff {
                        display_diff(&entry.attribute, before, after);
                    }
                    total_changed += 1;
                }
                Ok(RuleOutcome::Unchanged) => total_unchanged += 1,
                Ok(RuleOutcome::Skipped { reason }) => {
                    println!("{} {}: Skipped ({})", "⊘".cyan(), entry.rule_id, reason);
                    total_skipped += 1;
                }
                Err(e) => {
                    eprintln!("{} {}", "✗".red(), e);
                    total_failed += 1;
                }
            }
        }
        println!();

        if report.aborted {
            eprintln!("{}", format!("Aborted by {}", path.display()).red());
            aborted = true;
            break;
        }
    }

    if !dry_run && !aborted {
        let target = output.as_deref().unwrap_or(input);
        file.write(target)?;
        println!("Wrote {}", target.display());
    }

    println!("{}", "Summary:".bold());
    println!("  {} changed", format!("{}", total_changed).green());
    println!("  {} unchanged", format!("{}", total_unchanged).normal());
    println!("  {} skipped", format!("{}", total_skipped).cyan());
    println!("  {} failed", format!("{}", total_failed).red());

    if total_failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn display_name(set: &RuleSet, path: &Path) -> String {
    if set.meta.name.is_empty() {
        path.display().to_string()
    } else {
        set.meta.name.clone()
    }
}

fn cmd_check(paths: Vec<PathBuf>) -> Result<()> {
    let mut invalid = 0;
    for path in rule_files(paths)? {
        match load_from_path(&path) {
            Ok(set) => println!(
                "{} {}: {} rules",
                "✓".green(),
                path.display(),
                set.rules.len()
            ),
            Err(e) => {
                eprintln!("{} {}", "✗".red(), e);
                invalid += 1;
            }
        }
    }

    if invalid > 0 {
        std::process::exit(1);
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct RuleSetSummary {
    path: PathBuf,
    name: String,
    requires: Option<String>,
    rules: Vec<String>,
}

fn cmd_list(dir: &Path, json: bool) -> Result<()> {
    let mut summaries = Vec::new();
    for path in discover_rule_files(dir)? {
        let set = load_from_path(&path)?;
        summaries.push(RuleSetSummary {
            name: set.meta.name.clone(),
            requires: set.meta.requires.clone(),
            rules: set
                .rules
                .iter()
                .map(|r| format!("{} ({})", r.id, r.rule.kind()))
                .collect(),
            path,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for summary in &summaries {
        println!(
            "{} {}",
            summary.path.display().to_string().bold(),
            summary.name.dimmed()
        );
        if let Some(req) = &summary.requires {
            println!("  requires {req}");
        }
        for rule in &summary.rules {
            println!("  - {rule}");
        }
    }
    Ok(())
}

fn cmd_preview(pattern: &str, replacement: &str, input: &str, case_sensitive: bool) -> Result<()> {
    let engine = StdRegexEngine;
    let expanded = PatternReplacer::new(&engine)
        .expanded_replacement(pattern, input, replacement, case_sensitive)
        .context("invalid pattern")?;
    if expanded.is_empty() {
        eprintln!("{}", "no match".yellow());
    }
    println!("{expanded}");
    Ok(())
}

fn cmd_expand(template: String, input: &str, delimiter: char, between: String) -> Result<()> {
    let config = TokenizerConfig {
        delimiter,
        template,
        text_between: between,
        token_count: LengthPredicate::Any,
    };
    config.validate()?;
    match expand_template(input, &config, &StdRegexEngine)? {
        Some(out) => println!("{out}"),
        None => println!("{input}"),
    }
    Ok(())
}
