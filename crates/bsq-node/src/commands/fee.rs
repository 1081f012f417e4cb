use colored::*;
use std::sync::Arc;

use bsq_core::dao_config::DaoConfig;
use bsq_network::{FeeLookupClient, FeeProvider, HttpFeeProvider, TokioScheduler};

use crate::{print_error, print_info, print_success};

/// Try each configured provider in order until one settles with a fee.
pub async fn lookup(
    config: &DaoConfig,
    tx_id: &str,
    only: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let names: Vec<String> = match only {
        Some(name) => vec![name.to_string()],
        None => config.fee_lookup.providers.clone(),
    };
    let scheduler = Arc::new(TokioScheduler::from_config(&config.fee_lookup));

    for name in &names {
        let provider: Arc<dyn FeeProvider> = match HttpFeeProvider::by_name(name) {
            Some(p) => Arc::new(p),
            None => {
                print_error(&format!("Unknown fee provider '{}'", name));
                continue;
            }
        };
        print_info(&format!("Requesting fee for {} from {}...", tx_id, name));

        let client = FeeLookupClient::new(provider, scheduler.clone());
        match client.request(tx_id).await? {
            Ok(fee) => {
                print_success(&format!("Fee: {} sat", fee.to_string().green()));
                return Ok(());
            }
            Err(e) => print_error(&e.to_string()),
        }
    }

    Err(format!("No provider returned a fee for {}", tx_id).into())
}
