use super::logging;
use super::render;
use super::setup::{Cli, Commands};
use anyhow::{Context, Result};
use binderapp::api::{BinderApi, CmdResult};
use binderapp::catalog::CatalogProvider;
use binderapp::config::BinderConfig;
use binderapp::init::{open, resolve_data_dir};
use binderapp::pages::ViewMode;
use binderapp::store::DataStore;
use clap::Parser;
use tracing::debug;

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = resolve_data_dir(cli.data.clone())?;
    let mut config = BinderConfig::load(&data_dir)
        .with_context(|| format!("loading configuration from {}", data_dir.display()))?;
    logging::init(cli.verbose, config.log.as_deref());

    if let Some(user) = cli.user.clone() {
        config.user = user;
    }
    let mut ctx = open(data_dir, config).context("opening binder data")?;

    // Naked `binder` lists binders
    let command = cli.command.unwrap_or(Commands::List);
    let mode = match &command {
        Commands::Show { single: true, .. } => ViewMode::Single,
        _ => ViewMode::Spread,
    };

    debug!(?command, user = %ctx.api.user(), "dispatching");
    let result = dispatch(&mut ctx.api, command)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render::render(&result, mode));
    }
    Ok(())
}

pub fn dispatch<S: DataStore, C: CatalogProvider>(
    api: &mut BinderApi<S, C>,
    command: Commands,
) -> binderapp::error::Result<CmdResult> {
    match command {
        Commands::New { name, layout } => api.create_binder(&name, layout.as_deref()),
        Commands::List => api.list_binders(),
        Commands::Show { target, .. } => api.view_binder(&target.binder),
        Commands::Add {
            target,
            catalog_id,
            slot,
            shift,
        } => api.add_card(&target.binder, &catalog_id, &slot, shift),
        Commands::Fill {
            target,
            catalog_ids,
            from,
        } => api.fill(&target.binder, catalog_ids.as_slice(), &from),
        Commands::Remove {
            target,
            slot,
            shift,
        } => api.remove_card(&target.binder, &slot, shift),
        Commands::Swap { target, from, to } => api.swap(&target.binder, &from, &to),
        Commands::Insert { target, from, to } => api.insert(&target.binder, &from, &to),
        Commands::MakeRoom { target, slot } => api.make_room(&target.binder, &slot),
        Commands::Purchase {
            target,
            slot,
            yes,
            no,
        } => {
            let purchased = match (yes, no) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            api.set_purchased(&target.binder, &slot, purchased)
        }
        Commands::Link { target, slot, url } => {
            api.set_purchase_link(&target.binder, &slot, url.as_deref())
        }
        Commands::Price { target, slot } => api.refresh_prices(&target.binder, slot.as_deref()),
        Commands::Rename { target, name } => api.rename_binder(&target.binder, &name),
        Commands::Layout { target, layout } => api.set_layout(&target.binder, &layout),
        Commands::GrayOut { target, off } => api.set_gray_out(&target.binder, !off),
        Commands::Delete { target } => api.delete_binder(&target.binder),
        Commands::DefaultLayout { layout: None } => api.default_layout(),
        Commands::DefaultLayout {
            layout: Some(layout),
        } => api.set_default_layout(&layout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binderapp::catalog::StaticCatalog;
    use binderapp::test_utils::{mem_store, sample_catalog, MemStore};

    fn api() -> BinderApi<MemStore, StaticCatalog> {
        BinderApi::new(mem_store(), sample_catalog(), "alice")
    }

    fn exec(
        api: &mut BinderApi<MemStore, StaticCatalog>,
        args: &[&str],
    ) -> binderapp::error::Result<CmdResult> {
        let mut argv = vec!["binder"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).expect("valid args");
        dispatch(api, cli.command.expect("subcommand"))
    }

    #[test]
    fn test_dispatch_round_through_commands() {
        let mut api = api();
        exec(&mut api, &["new", "Modern", "--layout", "2x2"]).unwrap();
        exec(&mut api, &["fill", "Modern", "bolt", "ritual"]).unwrap();
        exec(&mut api, &["insert", "Modern", "1", "0"]).unwrap();
        exec(&mut api, &["purchase", "Modern", "0", "--yes"]).unwrap();

        let res = exec(&mut api, &["show", "Modern"]).unwrap();
        let view = res.view.unwrap();
        assert_eq!(view.cards[0].name, "Dark Ritual");
        assert!(view.cards[0].purchased);
        assert_eq!(view.binder.layout.to_string(), "2x2");
    }

    #[test]
    fn test_purchase_without_flag_toggles() {
        let mut api = api();
        exec(&mut api, &["new", "M"]).unwrap();
        exec(&mut api, &["add", "M", "bolt", "0"]).unwrap();

        let res = exec(&mut api, &["purchase", "M", "0"]).unwrap();
        assert!(res.affected_cards[0].purchased);
        let res = exec(&mut api, &["purchase", "M", "0"]).unwrap();
        assert!(!res.affected_cards[0].purchased);
    }

    #[test]
    fn test_gray_out_off() {
        let mut api = api();
        exec(&mut api, &["new", "M"]).unwrap();
        let res = exec(&mut api, &["gray-out", "M"]).unwrap();
        assert!(res.binders[0].gray_out_unpurchased);
        let res = exec(&mut api, &["gray-out", "M", "--off"]).unwrap();
        assert!(!res.binders[0].gray_out_unpurchased);
    }
}
