use anyhow::Context;
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

mod cli;
mod config;
mod developers;
mod factory;
mod filters;
mod search;
#[cfg(test)]
mod tests;
mod web;

use factory::AppFactory;
use filters::DEFAULT_PROFILE;
use search::{AttributeFilters, SearchType};

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("devsearch=info,tower_http=info"));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let args = cli::Args::parse();
    let mut config = AppFactory::load_config()?;

    match args.command {
        cli::Command::Serve { host, port } => {
            if let Some(host) = host {
                config.web.host = host;
            }
            if let Some(port) = port {
                config.web.port = port;
            }

            let engine = AppFactory::create_search_engine(&config, DEFAULT_PROFILE)?;
            web::start_daemon(engine, config)
        }

        cli::Command::Search {
            query,
            search_type,
            filter_mode,
            limit,
        } => {
            let search_type: SearchType = search_type.parse()?;
            let limit = limit.unwrap_or(config.search.default_limit);

            let engine = AppFactory::create_search_engine(&config, &filter_mode)?;
            let results = engine.search_developers(&query, search_type, limit)?;

            if results.candidates.is_empty() {
                eprintln!("no developers found");
            }
            print_json(&serde_json::json!({
                "query": query,
                "extracted_filters": results.filters,
                "filter_info": results.filters.describe(),
                "results": results.candidates,
            }))
        }

        cli::Command::Extract { query, filter_mode } => {
            let filters = AppFactory::create_filter_engine(&config, &filter_mode)?;
            let extracted = filters.extract(&query);

            print_json(&serde_json::json!({
                "query": query,
                "filter_mode": filters.profile().name,
                "strict_mode": filters.profile().strict_mode,
                "min_score_threshold": filters.profile().min_score_threshold,
                "extracted_filters": extracted,
                "filter_info": filters.describe(&extracted),
            }))
        }

        cli::Command::Filter {
            seniority,
            primary_role,
            availability,
            location,
            min_years,
            limit,
        } => {
            let attributes = AttributeFilters {
                seniority,
                primary_role,
                availability,
                location,
                min_years_experience: min_years,
            }
            .normalized();
            let limit = limit.unwrap_or(config.search.default_limit);

            let engine = AppFactory::create_search_engine(&config, DEFAULT_PROFILE)?;
            print_json(&engine.search_by_filters(&attributes, limit)?)
        }

        cli::Command::InitData { count, seed } => {
            let count = count.unwrap_or(config.search.sample_count);
            let developers = match seed {
                Some(seed) => {
                    developers::generate_sample_developers(count, &mut StdRng::seed_from_u64(seed))
                }
                None => developers::generate_sample_developers(count, &mut rand::rng()),
            };

            let engine = AppFactory::create_search_engine(&config, DEFAULT_PROFILE)?;
            let added = engine.add_developers(&developers)?;
            println!("{added} developers indexed");
            print_json(&engine.get_stats()?)
        }

        cli::Command::Stats {} => {
            let engine = AppFactory::create_search_engine(&config, DEFAULT_PROFILE)?;
            print_json(&engine.get_stats()?)
        }

        cli::Command::Profile { developer_id } => {
            let engine = AppFactory::create_search_engine(&config, DEFAULT_PROFILE)?;
            let developer = engine
                .get_developer_by_id(&developer_id)?
                .with_context(|| format!("developer {developer_id} not found"))?;
            print_json(&developer)
        }
    }
}
