mod cli;

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{
    AdminAction, Cli, Commands, FavoritesAction, HistoryAction, PrefsAction, RecordsAction,
    SourceCommand, UserCommand,
};
use vodcat::admin::{can_operate, AdminPanel, UserAction};
use vodcat::config::ClientConfig;
use vodcat::presenter::ViewMode;
use vodcat::types::FavoritePayload;
use vodcat::{current_epoch_millis, Vodcat};

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vodcat=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(u) = cli.base_url { config.base_url = u; }
    if let Some(u) = cli.database_url { config.database_url = Some(u); }

    let mut app = Vodcat::connect(config, true).await?;

    match cli.command {
        Commands::Search { query, flat, grouped, json } => {
            if flat { app.session().set_mode(ViewMode::Flat); }
            if grouped { app.session().set_mode(ViewMode::Grouped); }
            let view = app.search(&query).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{view}");
            }
        }
        Commands::History { action } => match action {
            HistoryAction::List => {
                for q in app.ledger().search_history().await? { println!("{q}"); }
            }
            HistoryAction::Delete { query } => app.ledger().delete_search_history(&query).await?,
            HistoryAction::Clear => app.ledger().clear_search_history().await?,
        },
        Commands::Favorites { action } => match action {
            FavoritesAction::List => {
                for f in app.ledger().list_favorites().await? {
                    let p = &f.payload;
                    println!("{}+{}\t{} ({})\t{}", f.source, f.id, p.title, p.year, p.source_name);
                }
            }
            FavoritesAction::Toggle { source, id, title, source_name, year, cover, episodes } => {
                let payload = FavoritePayload {
                    title,
                    source_name,
                    year,
                    cover,
                    total_episodes: episodes.max(1),
                    save_time: current_epoch_millis(),
                };
                let on = app.ledger().toggle_favorite(&source, &id, &payload).await?;
                println!("{}", if on { "favorited" } else { "removed from favorites" });
            }
        },
        Commands::Records { action } => match action {
            RecordsAction::List => {
                for r in app.ledger().list_play_records().await? {
                    let p = &r.payload;
                    println!(
                        "{}+{}\t{}\tep {}/{}\t{}s/{}s",
                        r.source,
                        r.id,
                        p.title,
                        p.index,
                        p.total_episodes,
                        p.play_time,
                        p.total_time
                    );
                }
            }
            RecordsAction::Delete { source, id } => {
                app.ledger().delete_play_record(&source, &id).await?
            }
            RecordsAction::Clear => {
                let n = app.ledger().clear_play_records().await?;
                println!("removed {n} records");
            }
        },
        Commands::Prefs { action } => {
            match action {
                PrefsAction::Show => {}
                PrefsAction::Set { key, value } => app.set_preference(&key, &value).await?,
                PrefsAction::Reset => app.reset_preferences().await?,
            }
            println!("{}", serde_json::to_string_pretty(app.preferences())?);
        }
        Commands::Login { username, password } => app.login(&username, &password).await?,
        Commands::Logout => app.logout().await?,
        Commands::Vacuum => app.vacuum_db().await?,
        Commands::Admin { action } => run_admin(&app, action).await?,
    }
    Ok(())
}

async fn run_admin(app: &Vodcat, action: AdminAction) -> Result<()> {
    let mut panel = app.admin_panel();
    panel.refresh().await?;
    match action {
        AdminAction::Config => {
            if let Some(cfg) = panel.config() {
                println!("{}", serde_json::to_string_pretty(cfg)?);
            }
            println!("role: {:?}", panel.role());
        }
        AdminAction::User { action } => run_user(app, &mut panel, action).await?,
        AdminAction::Source { action } => match action {
            SourceCommand::List => {
                for (i, s) in panel.sources().iter().enumerate() {
                    let state = if s.disabled { "disabled" } else { "enabled" };
                    println!("{i}\t{}\t{}\t{state}\t{:?}\t{}", s.key, s.name, s.from, s.api);
                }
            }
            SourceCommand::Add { key, name, api, detail } => {
                panel.add_source(&key, &name, &api, detail.as_deref()).await?
            }
            SourceCommand::Toggle { key } => panel.toggle_source(&key).await?,
            SourceCommand::Delete { key } => panel.delete_source(&key).await?,
            SourceCommand::Move { from, to } => {
                if !panel.move_source(from, to) { bail!("cannot move source {from} to {to}"); }
                panel.save_source_order().await?;
            }
        },
        AdminAction::Site { name, announcement, max_page, cache_time, default_aggregate } => {
            let mut site = panel.config().map(|c| c.site_config.clone()).unwrap_or_default();
            if let Some(v) = name { site.site_name = v; }
            if let Some(v) = announcement { site.announcement = v; }
            if let Some(v) = max_page { site.search_downstream_max_page = v; }
            if let Some(v) = cache_time { site.site_interface_cache_time = v; }
            if let Some(v) = default_aggregate { site.search_result_default_aggregate = v; }
            panel.save_site(&site).await?;
        }
        AdminAction::Reset { yes } => {
            if !yes { bail!("resetting discards all server settings; pass --yes to confirm"); }
            panel.reset().await?;
        }
    }
    Ok(())
}

async fn run_user(app: &Vodcat, panel: &mut AdminPanel, action: UserCommand) -> Result<()> {
    let action = match action {
        UserCommand::List => {
            let current = app.admin_client().current_username().await;
            let role = panel.role();
            for u in panel.users().await {
                let manageable = role.is_some_and(|r| can_operate(r, current.as_deref(), &u));
                let banned = if u.banned { " banned" } else { "" };
                let marker = if manageable { "" } else { " (read-only)" };
                println!("{}\t{:?}{banned}{marker}", u.username, u.role);
            }
            return Ok(());
        }
        UserCommand::AllowRegister { allow } => return Ok(panel.set_allow_register(allow).await?),
        UserCommand::Add { username, password } => UserAction::Add { username, password },
        UserCommand::Ban { username } => UserAction::Ban(username),
        UserCommand::Unban { username } => UserAction::Unban(username),
        UserCommand::SetAdmin { username } => UserAction::SetAdmin(username),
        UserCommand::CancelAdmin { username } => UserAction::CancelAdmin(username),
    };
    panel.user_action(action).await?;
    Ok(())
}
