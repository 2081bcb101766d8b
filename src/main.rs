//! installkit - main entry point

use anyhow::{Context, Result};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use installkit::cli::{Cli, Commands};
use installkit::{
    Catalog, CatalogConfig, CheckKind, CheckState, Decision, ResolutionPolicy, TreeEntry,
};

/// Initialize logging; RUST_LOG overrides the level chosen here
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);
    debug!("CLI arguments parsed: {:?}", cli);

    let base = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            CatalogConfig::load_from_file(path)?
        }
        None => CatalogConfig::default(),
    };
    let config = cli.apply_overrides(base);
    config.validate().context("Invalid configuration")?;

    let mut catalog = Catalog::load(&config).context("Failed to load definitions")?;

    match &cli.command {
        Commands::Tree => print_tree(&catalog),
        Commands::Show { id } => show_item(&catalog, id)?,
        Commands::Deps { id } => print_dependencies(&catalog, id.as_deref())?,
        Commands::Presets => print_presets(&catalog),
        Commands::Select {
            preset,
            check,
            uncheck,
            dependencies,
            dependents,
        } => {
            if let Some(preset) = preset {
                catalog
                    .apply_preset(preset)
                    .with_context(|| format!("Failed to apply preset '{}'", preset))?;
            }

            let policy = ResolutionPolicy {
                dependencies: *dependencies,
                dependents: *dependents,
            };
            let requests = check
                .iter()
                .map(|id| (id, CheckState::Checked))
                .chain(uncheck.iter().map(|id| (id, CheckState::Unchecked)));

            for (id, state) in requests {
                let decision = catalog.request(id, state, policy)?;
                if let Some(message) = explain(id, state, &decision) {
                    error!("{}", message);
                    eprintln!("✗ {}", message);
                    std::process::exit(1);
                }
            }

            print_tree(&catalog);
            print_plan(&catalog);
        }
    }

    Ok(())
}

/// Human-readable reason a request did not go through, if it did not
fn explain(id: &str, state: CheckState, decision: &Decision) -> Option<String> {
    match decision {
        Decision::Applied | Decision::Unchanged => None,
        Decision::Declined => Some(format!("Setting '{}' {} was declined", id, state)),
        Decision::MissingDependencies(ids) => Some(format!(
            "Can't select '{}' due to missing dependencies: {}",
            id,
            ids.join(", ")
        )),
        Decision::NeedsDependencyConfirm(ids) => Some(format!(
            "'{}' requires unchecked dependencies: {} (pass --dependencies accept|ignore|decline)",
            id,
            ids.join(", ")
        )),
        Decision::NeedsDependentConfirm(ids) => Some(format!(
            "Unchecking '{}' would orphan: {} (pass --dependents accept|ignore|decline)",
            id,
            ids.join(", ")
        )),
    }
}

fn print_tree(catalog: &Catalog) {
    let tree = catalog.tree();
    tree.walk(|depth, entry| {
        let indent = "  ".repeat(depth);
        match entry {
            TreeEntry::Category(node) => println!("{}{}/", indent, tree.node(*node).name),
            TreeEntry::Item(replica) => {
                let item = catalog.items().replica(*replica);
                let mark = match (item.check_kind, item.is_checked()) {
                    (CheckKind::None, _) => "   ",
                    (CheckKind::Checkbox, true) => "[x]",
                    (CheckKind::Checkbox, false) => "[ ]",
                    (CheckKind::Radio, true) => "(*)",
                    (CheckKind::Radio, false) => "( )",
                };
                if item.summary.is_empty() {
                    println!("{}{} {} ({})", indent, mark, item.name, item.id);
                } else {
                    println!(
                        "{}{} {} ({}) - {}",
                        indent, mark, item.name, item.id, item.summary
                    );
                }
            }
        }
    });
}

fn show_item(catalog: &Catalog, id: &str) -> Result<()> {
    let items = catalog.items();
    let item = items
        .first(id)
        .with_context(|| format!("No item with id '{}'", id))?;
    let categories: Vec<&str> = items.replicas(id).map(|r| r.category.as_str()).collect();

    println!("{} ({})", item.name, item.id);
    if !item.summary.is_empty() {
        println!("  summary:     {}", item.summary);
    }
    if !item.tooltip.is_empty() {
        println!("  tooltip:     {}", item.tooltip);
    }
    println!("  kind:        {}", item.check_kind);
    println!("  checked:     {}", item.is_checked());
    println!("  categories:  {}", categories.join(", "));
    println!("  directory:   {}", item.cwd.display());
    println!("  depends:     {}", item.depends.join(", "));
    println!("  depended by: {}", item.depended_by().join(", "));
    println!("  commands:");
    for (name, command) in item.commands.iter() {
        println!("    {} = {}", name, command);
    }
    println!();
    println!("{}", item.helptext);
    Ok(())
}

fn print_dependencies(catalog: &Catalog, id: Option<&str>) -> Result<()> {
    let items = catalog.items();
    let ids: Vec<&str> = match id {
        Some(id) => vec![id],
        None => items.ids().collect(),
    };

    for id in ids {
        let closure = items.dependency_closure(id)?;
        let deps: Vec<&str> = closure.iter().map(String::as_str).collect();
        let missing: Vec<&str> = deps
            .iter()
            .copied()
            .filter(|dep| !items.contains(dep))
            .collect();

        println!("{} depends on: {}", id, deps.join(", "));
        if !missing.is_empty() {
            println!("  missing: {}", missing.join(", "));
        }
    }
    Ok(())
}

fn print_presets(catalog: &Catalog) {
    if catalog.presets().is_empty() {
        println!("No presets found");
        return;
    }
    for preset in catalog.presets().iter() {
        println!("{} - {}", preset.id, preset.name);
        println!("  includes: {}", preset.includes.join(", "));
        println!("  excludes: {}", preset.excludes.join(", "));
    }
}

fn print_plan(catalog: &Catalog) {
    let plan = catalog.install_plan();
    println!();
    println!("Selected {} item(s):", plan.len());
    for entry in plan {
        println!("  {} ({}) in {}", entry.name, entry.id, entry.cwd.display());
        for (name, command) in entry.commands.iter() {
            println!("    {}: {}", name, command);
        }
    }
}
