// SPDX-License-Identifier: MPL-2.0
use reactive_l10n::config;
use reactive_l10n::error::Result;
use reactive_l10n::i18n::{
    Attribute, AttributedText, BindingId, BindingTable, ConfigStore, LanguagePreference,
    LanguageTag, Localizable, LocalizableExt, Localization, Localizer, MainQueue, QueuedDispatcher,
    Rgba,
};
use reactive_l10n::localize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;

const HELP: &str = "\
reactive-l10n: live UI localization demo

USAGE:
  reactive-l10n [OPTIONS]

OPTIONS:
  --lang <TAG|system>   Switch to this language after the first render
  --config-dir <DIR>    Read and persist settings.toml in DIR
  --resources <DIR>     Load extra .ftl files from DIR (<table>/<lang>.ftl)
  --list                Print the available languages and exit
  -h, --help            Print this help
";

struct Args {
    lang: Option<String>,
    config_dir: Option<PathBuf>,
    resources: Option<PathBuf>,
    list: bool,
}

fn parse_args() -> std::result::Result<Option<Args>, pico_args::Error> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        return Ok(None);
    }

    let parsed = Args {
        lang: args.opt_value_from_str("--lang")?,
        config_dir: args.opt_value_from_str("--config-dir")?,
        resources: args.opt_value_from_str("--resources")?,
        list: args.contains("--list"),
    };

    let rest = args.finish();
    if !rest.is_empty() {
        tracing::warn!(?rest, "ignoring unexpected arguments");
    }
    Ok(Some(parsed))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("reactive_l10n=info")),
        )
        .init();

    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => {
            print!("{}", HELP);
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            eprintln!("Error: {}\n\n{}", error, HELP);
            return ExitCode::FAILURE;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let target = args.lang.as_deref().map(parse_preference).transpose()?;

    let (mut settings, warning) = config::load_with_override(args.config_dir.clone());
    if let Some(warning) = warning {
        tracing::warn!(%warning, "using default settings");
    }
    if let Some(dir) = args.resources {
        settings.localization.resources_dir = Some(dir);
    }

    let (dispatcher, mut queue) = QueuedDispatcher::new();
    let store = ConfigStore::with_override(args.config_dir)?;
    tracing::debug!(path = %store.path().display(), "persisting preference");
    let l10n = Localization::from_config(&settings, store, Arc::new(dispatcher))?;

    if args.list {
        for tag in l10n.available_languages() {
            println!("{}", tag);
        }
        return Ok(());
    }

    let screen = Screen::build(&l10n);
    screen.print(&l10n.preference());

    if let Some(preference) = target {
        switch_from_worker(&l10n, preference, &mut queue);
        screen.print(&l10n.preference());
        if l10n.preferences().is_memory_only() {
            tracing::warn!("language choice could not be saved");
        }
    }
    Ok(())
}

fn parse_preference(raw: &str) -> Result<LanguagePreference> {
    if raw.eq_ignore_ascii_case("system") {
        return Ok(LanguagePreference::FollowSystem);
    }
    Ok(LanguagePreference::Specified(LanguageTag::parse(raw)?))
}

/// Changes the preference off the UI thread, then drains the deliveries here.
fn switch_from_worker(l10n: &Arc<Localization>, preference: LanguagePreference, queue: &mut MainQueue) {
    let worker = Arc::clone(l10n);
    let handle = thread::spawn(move || worker.set_preference(preference));
    if handle.join().is_err() {
        tracing::warn!("preference worker panicked");
    }
    let delivered = queue.run_pending();
    tracing::debug!(delivered, "applied language change");
}

// =============================================================================
// Demo widgets
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ControlState {
    Normal,
    Highlighted,
}

impl std::fmt::Display for ControlState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Highlighted => write!(f, "highlighted"),
        }
    }
}

struct Label {
    text: RwLock<String>,
    content: RwLock<AttributedText>,
    bindings: BindingTable,
}

impl Label {
    fn new(l10n: &Arc<Localization>) -> Arc<Self> {
        Arc::new(Self {
            text: RwLock::default(),
            content: RwLock::default(),
            bindings: BindingTable::with_context(l10n),
        })
    }

    fn set_text(&self, text: String) {
        *self.text.write().unwrap_or_else(PoisonError::into_inner) = text;
    }

    fn set_content(&self, content: AttributedText) {
        *self.content.write().unwrap_or_else(PoisonError::into_inner) = content;
    }

    fn render(&self) -> String {
        let content = self.content.read().unwrap_or_else(PoisonError::into_inner);
        let text = self.text.read().unwrap_or_else(PoisonError::into_inner);
        if content.text().is_empty() {
            text.clone()
        } else {
            format!("{} ({} styled runs)", content.text(), content.runs().len())
        }
    }
}

impl Localizable for Label {
    fn bindings(&self) -> &BindingTable {
        &self.bindings
    }
}

struct Button {
    titles: RwLock<BTreeMap<ControlState, String>>,
    bindings: BindingTable,
}

impl Button {
    fn new(l10n: &Arc<Localization>) -> Arc<Self> {
        Arc::new(Self {
            titles: RwLock::default(),
            bindings: BindingTable::with_context(l10n),
        })
    }

    fn bind_title(self: &Arc<Self>, state: ControlState, localizer: Localizer<String>) {
        self.l10n()
            .text(BindingId::scoped("title", state), move |button: &Button, title| {
                button
                    .titles
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(state, title);
            })
            .bind(localizer);
    }

    fn render(&self) -> String {
        self.titles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(state, title)| format!("{}={:?}", state, title))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Localizable for Button {
    fn bindings(&self) -> &BindingTable {
        &self.bindings
    }
}

struct Screen {
    greeting: Arc<Label>,
    language: Arc<Label>,
    button: Arc<Button>,
}

impl Screen {
    fn build(l10n: &Arc<Localization>) -> Self {
        let greeting = Label::new(l10n);
        greeting.l10n().text("text", Label::set_text).bind_key("hello");

        let language = Label::new(l10n);
        language
            .l10n()
            .attributed_content("content", Label::set_content)
            .bind(localize!(l10n; "current-language" => |text: String| {
                AttributedText::styled(text, [Attribute::ForegroundColor(Rgba::PINK), Attribute::Bold])
            }));

        let button = Button::new(l10n);
        button.bind_title(ControlState::Normal, l10n.pure("language"));
        button.bind_title(
            ControlState::Highlighted,
            localize!(l10n; "part-1", "part-2" => |a, b| format!("{} {}", a, b)),
        );

        Self {
            greeting,
            language,
            button,
        }
    }

    fn print(&self, preference: &LanguagePreference) {
        println!("[{}]", preference);
        println!("  label:  {}", self.greeting.render());
        println!("  label:  {}", self.language.render());
        println!("  button: {}", self.button.render());
    }
}
