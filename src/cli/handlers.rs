use crate::apps::{self, User};
use crate::cli::commands::*;
use crate::config::{self, LauncherConfig};
use crate::error::{LauncherError, Result};
use crate::help::{self, HelpEntry, APP_NAME_PLACEHOLDER};
use crate::models::{self, AppContext, ModelContextStore, ModelDescriptor};
use crate::subsidy::backend::{Assessment, CompleteAssessment};
use crate::subsidy::{
    FileTokenStore, HttpSubsidyBackend, SubsidyCriterion, SubsidyResult, SubsidyStore,
};
use std::path::Path;
use std::sync::Arc;

/// Config from `path`, or from the default location, with env overrides applied
pub fn load_config(path: Option<&Path>) -> Result<LauncherConfig> {
    let config = match path {
        Some(path) => config::loader::load_config_from(path)?,
        None => config::loader::load_config()?,
    };
    config::loader::apply_env(config)
}

pub async fn handle_command(cli: Cli, config: LauncherConfig) -> Result<()> {
    match cli.command {
        Commands::Apps { user, all } => handle_apps(user.as_deref(), all),
        Commands::Manual { section, raw } => handle_manual(&config, section.as_deref(), raw),
        Commands::Models { file, route } => handle_models(&config, &file, &route).await,
        Commands::Subsidy { action } => handle_subsidy(&config, action).await,
        Commands::Config { action } => handle_config(&config, cli.config.as_deref(), action),
    }
}

fn handle_apps(user: Option<&str>, all: bool) -> Result<()> {
    let user = match user {
        Some(json) => User::new(serde_json::from_str(json)?),
        None => User::anonymous(),
    };

    println!(
        "{:<4} {:<14} {:<30} {:<14} {:<26}",
        "", "App", "Route", "Context", "Capability"
    );
    println!("{}", "-".repeat(90));

    if all {
        for app in apps::apps() {
            let mark = if app.is_permitted(&user) { "✔" } else { "✘" };
            print_app(mark, app);
        }
    } else {
        for app in apps::list_apps(&user) {
            print_app(app.icon, app);
        }
    }

    Ok(())
}

fn print_app(mark: &str, app: &apps::AppDescriptor) {
    println!(
        "{:<4} {:<14} {:<30} {:<14} {:<26}",
        mark,
        app.name,
        app.route,
        app.context.to_string(),
        app.capability_key.unwrap_or("-")
    );
}

fn handle_manual(config: &LauncherConfig, section: Option<&str>, raw: bool) -> Result<()> {
    let app_name = &config.branding.app_name;

    if let Some(id) = section {
        let entry = help::find_entry(id)
            .ok_or_else(|| LauncherError::InvalidInput(format!("No help section '{}'", id)))?;
        let emoji = match entry {
            HelpEntry::Section(s) => &s.emoji,
            HelpEntry::Item(i) => &i.emoji,
        };
        println!("\n{} {}\n", emoji, brand(entry.title(), app_name));
        print_content(entry.content(), app_name, raw);
        return Ok(());
    }

    for section in help::sections() {
        println!("{} {} [{}]", section.emoji, brand(&section.title, app_name), section.id);
        for item in &section.items {
            println!("    {} {} [{}]", item.emoji, brand(&item.title, app_name), item.id);
        }
    }
    println!("\nShow a section with: govchat-launcher manual <id>");
    Ok(())
}

async fn handle_models(config: &LauncherConfig, file: &Path, routes: &[String]) -> Result<()> {
    let content = std::fs::read_to_string(file)?;
    let model_list = models::parse_model_list(&content)?;
    println!("Loaded {} models", model_list.len());

    let store = ModelContextStore::new(config.models.empty_match_policy);
    let mut view = store.subscribe();
    store.set_models(Some(model_list));

    if routes.is_empty() {
        print_models(store.context(), None, &store.filtered_models());
        return Ok(());
    }

    for route in routes {
        let context = store.set_context_from_route(route);
        print_models(context, Some(route), &view.current());
    }
    Ok(())
}

fn print_models(context: AppContext, route: Option<&str>, filtered: &[ModelDescriptor]) {
    match route {
        Some(route) => {
            let app = apps::find_by_route(route)
                .map(|a| format!(" [{}]", a.name))
                .unwrap_or_default();
            println!("\n{}{} → {} ({})", route, app, context, context.capability_key());
        }
        None => println!("\n{} ({})", context, context.capability_key()),
    }
    if filtered.is_empty() {
        println!("  (no models)");
    }
    for model in filtered {
        println!("  {:<36} {}", model.id, truncate(&model.name, 40));
    }
}

fn subsidy_store(config: &LauncherConfig) -> Result<SubsidyStore> {
    let tokens = FileTokenStore::new(config::loader::token_path(config)?);
    tracing::debug!("Reading API token from {}", tokens.path().display());
    let backend = HttpSubsidyBackend::new(&config.api.base_url, Arc::new(tokens))?;
    Ok(SubsidyStore::new(Arc::new(backend)))
}

async fn handle_subsidy(config: &LauncherConfig, action: SubsidyCommands) -> Result<()> {
    let store = subsidy_store(config)?;

    match action {
        SubsidyCommands::List => {
            let items = store.list().await;
            if items.is_empty() {
                println!("No saved subsidy criteria.");
                return Ok(());
            }
            print_results(&items);
        }
        SubsidyCommands::Show { id } => {
            let output = resolve(&store, id, "Select saved criteria").await?;
            print_result(&output);
        }
        SubsidyCommands::Save { file, name } => {
            let content = std::fs::read_to_string(&file)?;
            let mut draft = parse_draft(&content)?;
            if name.is_some() {
                draft.name = name;
            }
            let saved = store.save(draft).await?;
            println!(
                "Saved {} (ID: {})",
                saved.label(),
                saved.saved_id.unwrap_or_default()
            );
        }
        SubsidyCommands::Extract {
            file,
            model,
            save,
            name,
        } => {
            let text = std::fs::read_to_string(&file)?;
            let mut draft = store.extract_criteria(&text, model.as_deref()).await?;
            print_result(&draft);
            if save {
                draft.name = name;
                let saved = store.save(draft).await?;
                println!("\nSaved (ID: {})", saved.saved_id.unwrap_or_default());
            }
        }
        SubsidyCommands::Assess {
            file,
            criteria,
            model,
            complete,
        } => {
            let text = std::fs::read_to_string(&file)?;
            let selection = match criteria {
                Some(id) => {
                    let output = resolve(&store, Some(id), "Select criteria").await?;
                    store.select(Some(output.clone()), false);
                    Some(output)
                }
                None => match store.load_last_selection().await {
                    Some(selection) => Some(selection),
                    None => store.load_global_selection().await,
                },
            };
            if let Some(selection) = &selection {
                println!(
                    "Assessing against {} ({} criteria)",
                    selection.label(),
                    selection.criteria.len()
                );
            }

            if complete {
                let result = store.complete_assessment(&text, model.as_deref()).await?;
                print_complete_assessment(&result);
            } else {
                let result = store.assess(&text, model.as_deref()).await?;
                print_assessment(&result);
            }
        }
        SubsidyCommands::Delete { id } => {
            let id = match id {
                Some(id) => id,
                None => pick(&store, "Select criteria to delete").await?.saved_id.unwrap_or_default(),
            };
            store.delete(&id).await?;
            println!("Deleted {}", id);
        }
        SubsidyCommands::Clear { yes } => {
            let items = store.list().await;
            if items.is_empty() {
                println!("Nothing to delete.");
                return Ok(());
            }
            if !yes && !confirm(&format!("Delete all {} saved criteria?", items.len()))? {
                return Ok(());
            }
            let failed = store.clear_all().await;
            if failed.is_empty() {
                println!("Deleted {} saved criteria.", items.len());
            } else {
                eprintln!(
                    "Deleted {} of {}; still on the server: {}",
                    items.len() - failed.len(),
                    items.len(),
                    failed.join(", ")
                );
            }
        }
        SubsidyCommands::Select { id, no_persist } => {
            let output = resolve(&store, id, "Select criteria").await?;
            let label = output.label();
            if let Some(handle) = store.select(Some(output), !no_persist) {
                if let Err(e) = handle.await {
                    tracing::warn!("Persisting selection {} did not finish: {}", label, e);
                }
            }
            println!("Selected {}", label);
        }
        SubsidyCommands::Selection => match store.load_last_selection().await {
            Some(selection) => print_result(&selection),
            None => println!("No selection found."),
        },
        SubsidyCommands::Global => match store.load_global_selection().await {
            Some(selection) => print_result(&selection),
            None => println!("No organisation-wide selection found."),
        },
        SubsidyCommands::SetGlobal { id } => {
            let output = resolve(&store, id, "Select criteria for everyone").await?;
            store.set_global_selection(&output).await?;
            println!("{} is now the organisation-wide selection", output.label());
        }
    }

    Ok(())
}

/// A saved result by id, or picked interactively when no id is given
async fn resolve(store: &SubsidyStore, id: Option<String>, prompt: &str) -> Result<SubsidyResult> {
    match id {
        Some(id) => {
            store.refresh().await.map_err(unreachable_backend)?;
            store.find(&id).ok_or(LauncherError::NotFound(id))
        }
        None => pick(store, prompt).await,
    }
}

async fn pick(store: &SubsidyStore, prompt: &str) -> Result<SubsidyResult> {
    use dialoguer::{theme::ColorfulTheme, Select};

    let items = store.refresh().await.map_err(unreachable_backend)?;
    if items.is_empty() {
        return Err(LauncherError::NotFound("no saved subsidy criteria".to_string()));
    }

    let labels: Vec<String> = items
        .iter()
        .map(|o| format!("{} | {} criteria", truncate(&o.label(), 40), o.criteria.len()))
        .collect();

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact()
        .map_err(|e| LauncherError::InvalidInput(format!("Selection cancelled: {}", e)))?;

    Ok(items[selection].clone())
}

/// Backend failure while looking up saved results
fn unreachable_backend(e: LauncherError) -> LauncherError {
    match e {
        LauncherError::Api(message) => {
            LauncherError::Api(format!("could not load saved criteria: {}", message))
        }
        other => LauncherError::Api(format!("could not load saved criteria: {}", other)),
    }
}

/// A subsidy result, or a bare criteria array saved as a new draft
fn parse_draft(content: &str) -> Result<SubsidyResult> {
    match serde_json::from_str::<Vec<SubsidyCriterion>>(content) {
        Ok(criteria) => Ok(SubsidyResult::draft(criteria)),
        Err(_) => Ok(serde_json::from_str(content)?),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    use dialoguer::{theme::ColorfulTheme, Confirm};

    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| LauncherError::InvalidInput(format!("Confirmation cancelled: {}", e)))
}

fn handle_config(config: &LauncherConfig, explicit: Option<&Path>, action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            println!("{}", toml::to_string_pretty(config)?);
        }
        ConfigCommands::Path => match explicit {
            Some(path) => println!("{}", path.display()),
            None => println!("{}", config::loader::config_path()?.display()),
        },
        ConfigCommands::Init => {
            config::loader::ensure_directories()?;
            println!(
                "Configuration initialized at: {}",
                config::loader::config_path()?.display()
            );
            println!("\nSettings:");
            println!("  Backend: {}", config.api.base_url);
            println!("  Token file: {}", config::loader::token_path(config)?.display());
            println!("  App name: {}", config.branding.app_name);
        }
    }
    Ok(())
}

fn print_results(items: &[SubsidyResult]) {
    println!("{:<36} {:<32} {:<9} {:<20}", "ID", "Name", "Criteria", "Saved");
    println!("{}", "-".repeat(100));
    for item in items {
        println!(
            "{:<36} {:<32} {:<9} {:<20}",
            item.saved_id.as_deref().unwrap_or("-"),
            truncate(item.name.as_deref().unwrap_or("-"), 30),
            item.criteria.len(),
            item.timestamp.as_deref().map(|t| truncate(t, 19)).unwrap_or_default()
        );
    }
}

fn print_result(output: &SubsidyResult) {
    println!("\n# {}\n", output.label());
    if let Some(summary) = output.summary.as_deref().filter(|s| !s.is_empty()) {
        println!("{}\n", summary);
    }
    for criterion in &output.criteria {
        println!("{:>3}. {}", criterion.id, criterion.text);
    }
}

fn print_assessment(assessment: &Assessment) {
    println!("\n{:>4}  {:<6} {}", "#", "Score", "Criterium");
    println!("{}", "-".repeat(70));
    for (key, item) in assessment.items() {
        println!("{:>4}  {:<6} {}", key, item.score.to_string(), item.criterion);
        if !item.explanation.is_empty() {
            println!("{:>12}{}", "", item.explanation);
        }
    }
}

fn print_complete_assessment(result: &CompleteAssessment) {
    let summary = &result.summary;
    println!("\n# Aanvraag\n");
    println!("Aanvrager:       {}", summary.applicant);
    println!("Datum aanvraag:  {}", summary.application_date);
    println!("Datum evenement: {}", summary.event_date);
    println!("Bedrag:          {}", summary.amount);
    if !summary.summary.is_empty() {
        println!("\n{}", summary.summary);
    }

    print_assessment(&result.scores());

    let report = &result.report;
    println!("\n# Eindoordeel: {}\n", report.verdict);
    println!("Bedrag: {}", report.amount);
    if !report.summary.is_empty() {
        println!("\n{}", report.summary);
    }
}

fn print_content(html: &str, app_name: &str, raw: bool) {
    let content = brand(html, app_name);
    if raw {
        println!("{}", content);
    } else {
        println!("{}", html_to_text(&content));
    }
}

/// Replace the product-name placeholder
fn brand(text: &str, app_name: &str) -> String {
    text.replace(APP_NAME_PLACEHOLDER, app_name)
}

/// Rough terminal rendering of the help HTML: tags dropped, list items bulleted
fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let Some(end) = rest[start..].find('>') else {
            rest = &rest[start..];
            break;
        };
        let tag = rest[start + 1..start + end].trim().to_lowercase();
        if tag == "li" || tag.starts_with("li ") {
            out.push_str("• ");
        } else if tag == "br" || tag == "br/" || tag == "br /" {
            out.push('\n');
        }
        rest = &rest[start + end + 1..];
    }
    out.push_str(rest);

    let text = out
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"");

    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brand_replaces_every_placeholder() {
        assert_eq!(
            brand("Wat is {{APP_NAME}}? {{APP_NAME}} helpt.", "LimbotAI"),
            "Wat is LimbotAI? LimbotAI helpt."
        );
    }

    #[test]
    fn test_html_to_text() {
        let html = "<div class=\"text-sm\">\nIntro &amp; uitleg\n</div>\n<ul>\n<li><b>Snel:</b> altijd</li>\n</ul>Regel<br>twee";
        assert_eq!(html_to_text(html), "Intro & uitleg\n• Snel: altijd\nRegel\ntwee");
    }

    #[test]
    fn test_html_to_text_unclosed_tag() {
        assert_eq!(html_to_text("tekst <b"), "tekst <b");
    }

    #[test]
    fn test_parse_draft_accepts_bare_criteria() {
        let draft = parse_draft(r#"[{"id": 1, "text": "Doel"}]"#).unwrap();
        assert!(!draft.is_persisted());
        assert_eq!(draft.criteria.len(), 1);

        let result = parse_draft(r#"{"criteria": [], "name": "MKB", "savedId": "7"}"#).unwrap();
        assert_eq!(result.name.as_deref(), Some("MKB"));

        assert!(parse_draft("nope").is_err());
    }

    #[tokio::test]
    async fn test_resolve_reports_unreachable_backend() {
        let backend = HttpSubsidyBackend::with_client(
            reqwest::Client::builder().no_proxy().build().unwrap(),
            "http://127.0.0.1:9",
            Arc::new(crate::subsidy::StaticToken(None)),
        )
        .unwrap();
        let store = SubsidyStore::new(Arc::new(backend));

        let result = resolve(&store, Some("42".to_string()), "Select").await;
        assert!(matches!(result, Err(LauncherError::Api(_))));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("kort", 10), "kort");
        assert_eq!(truncate("geïnitieerd door Limburg", 10), "geïniti...");
    }

    #[test]
    fn test_shipped_help_renders_without_placeholders() {
        for section in help::sections() {
            let text = html_to_text(&brand(&section.content, "GovChat-NL"));
            assert!(!text.contains(APP_NAME_PLACEHOLDER));
            assert!(!text.contains('<') || !text.contains("</"));
        }
    }
}
