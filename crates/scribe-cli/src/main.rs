use std::cell::RefCell;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::{Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result, miette};
use scribe_editor_core::{
    EditorConfig, RichDocument, RichTextEditor, Selection, ToolbarCommand, formatting_state,
};
use scribe_renderer::{SanitizePolicy, Sanitizer};

#[derive(Parser)]
#[command(version, about = "scribe - rich-text editing tools for blog post HTML", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an HTML fragment and print its canonical form
    Normalize {
        /// Input file, or `-` for stdin
        file: PathBuf,
    },
    /// Print the HTML with everything unsafe removed
    Sanitize {
        /// Input file, or `-` for stdin
        file: PathBuf,

        /// Sanitizer policy JSON
        #[arg(long)]
        policy: Option<PathBuf>,
    },
    /// Print the toolbar formatting state for a selection as JSON
    State {
        /// Input file, or `-` for stdin
        file: PathBuf,

        /// Selection anchor (char offset)
        #[arg(long)]
        start: usize,

        /// Selection head (char offset)
        #[arg(long)]
        end: usize,
    },
    /// Run a toolbar command on a selection and print the resulting HTML
    Apply {
        /// Input file, or `-` for stdin
        file: PathBuf,

        /// One of: bold, italic, underline, heading, bullet-list,
        /// numbered-list, link, unlink
        #[arg(long, value_parser = parse_command)]
        command: ToolbarCommand,

        /// Selection anchor (char offset)
        #[arg(long)]
        start: usize,

        /// Selection head (char offset)
        #[arg(long)]
        end: usize,

        /// Link target, required by `link`
        #[arg(long)]
        url: Option<String>,

        /// Editor config JSON
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn parse_command(name: &str) -> std::result::Result<ToolbarCommand, String> {
    ToolbarCommand::from_name(name).ok_or_else(|| {
        let names: Vec<_> = ToolbarCommand::ALL.iter().map(|c| c.name()).collect();
        format!("unknown command `{name}`, expected one of: {}", names.join(", "))
    })
}

fn main() -> Result<()> {
    init_miette()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize { file } => {
            let html = read_input(&file)?;
            println!("{}", RichDocument::from_html(&html).to_html());
        }
        Commands::Sanitize { file, policy } => {
            let html = read_input(&file)?;
            let policy = match policy {
                Some(path) => SanitizePolicy::from_json_str(&read_input(&path)?)?,
                None => SanitizePolicy::default(),
            };
            println!("{}", Sanitizer::new(policy).clean(&html));
        }
        Commands::State { file, start, end } => {
            let html = read_input(&file)?;
            let doc = RichDocument::from_html(&html);
            let state = formatting_state(&doc, Some(Selection::new(start, end)));
            let json = serde_json::to_string_pretty(&state).into_diagnostic()?;
            println!("{json}");
        }
        Commands::Apply {
            file,
            command,
            start,
            end,
            url,
            config,
        } => {
            let html = read_input(&file)?;
            let config = match config {
                Some(path) => EditorConfig::from_json_str(&read_input(&path)?)?,
                None => EditorConfig::default(),
            };
            let out = apply_command(&html, &config, command, Selection::new(start, end), url)?;
            println!("{out}");
        }
    }

    Ok(())
}

/// Drive the editor the way a host would: render, select, click. Returns the
/// last change payload, or the unchanged content.
fn apply_command(
    html: &str,
    config: &EditorConfig,
    command: ToolbarCommand,
    selection: Selection,
    url: Option<String>,
) -> Result<String> {
    let last_change: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));
    let sink = last_change.clone();

    let mut editor = RichTextEditor::new(config);
    editor.render(html, move |html| *sink.borrow_mut() = Some(html.to_string()), "");
    editor.focus();
    editor.select(selection);

    if command == ToolbarCommand::InsertLink {
        let url = url.ok_or_else(|| miette!("`--url` is required for the link command"))?;
        if !editor.command(command) {
            return Err(miette!(
                "the link command needs a non-empty selection, got {}..{}",
                selection.anchor,
                selection.head
            ));
        }
        editor.link_url_input(&url);
        editor.confirm_link();
    } else {
        editor.command(command);
    }

    let changed = last_change.borrow_mut().take();
    Ok(changed.unwrap_or_else(|| {
        tracing::info!(command = command.name(), "command left the document unchanged");
        editor.html().to_string()
    }))
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .into_diagnostic()
            .wrap_err("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", path.display()))
}

fn init_miette() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    miette::set_panic_hook();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_bold() {
        let out = apply_command(
            "<p>hello world</p>",
            &EditorConfig::default(),
            ToolbarCommand::Bold,
            Selection::new(0, 5),
            None,
        )
        .unwrap();
        assert_eq!(out, "<p><b>hello</b> world</p>");
    }

    #[test]
    fn test_apply_link_requires_url() {
        let err = apply_command(
            "<p>hello</p>",
            &EditorConfig::default(),
            ToolbarCommand::InsertLink,
            Selection::new(0, 5),
            None,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_apply_link() {
        let out = apply_command(
            "<p>hello</p>",
            &EditorConfig::default(),
            ToolbarCommand::InsertLink,
            Selection::new(0, 5),
            Some("https://example.com".into()),
        )
        .unwrap();
        assert_eq!(out, r#"<p><a href="https://example.com">hello</a></p>"#);
    }

    #[test]
    fn test_apply_noop_returns_content() {
        let out = apply_command(
            "<strong>x</strong>",
            &EditorConfig::default(),
            ToolbarCommand::Italic,
            Selection::collapsed(0),
            None,
        )
        .unwrap();
        assert_eq!(out, "<p><b>x</b></p>");
    }

    #[test]
    fn test_parse_command_names() {
        assert_eq!(parse_command("bullet-list"), Ok(ToolbarCommand::BulletList));
        assert!(parse_command("strike").unwrap_err().contains("numbered-list"));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
