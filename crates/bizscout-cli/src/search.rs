//! `search` and `reviews` command handlers.

use clap::Args;

use bizscout_client::SearchClient;
use bizscout_core::{AppConfig, Coordinate, Item, ItemId, Review, SearchCriteria, SortMode};
use bizscout_session::Session;

#[derive(Debug, Args)]
pub(crate) struct SearchArgs {
    /// Search term (defaults to `BIZSCOUT_DEFAULT_TERM`)
    #[arg(long)]
    pub term: Option<String>,
    /// Search center as "lat,lng" (defaults to `BIZSCOUT_DEFAULT_LOCATION`)
    #[arg(long)]
    pub location: Option<Coordinate>,
    /// Result order: `best_matched`, `distance` or `highest_rated`
    #[arg(long)]
    pub sort: Option<SortMode>,
    /// Category alias; repeat for several
    #[arg(long = "category")]
    pub categories: Vec<String>,
    /// Only listings with deals
    #[arg(long)]
    pub deals: bool,
    /// Search radius in meters
    #[arg(long)]
    pub radius: Option<u32>,
    /// Number of pages to load
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,
    /// Narrow the loaded listings by name
    #[arg(long)]
    pub filter: Option<String>,
}

impl SearchArgs {
    /// Server-side criteria, falling back to configured defaults.
    pub(crate) fn criteria(&self, config: &AppConfig) -> SearchCriteria {
        let term = self
            .term
            .clone()
            .unwrap_or_else(|| config.default_term.clone());
        let location = self.location.unwrap_or(config.default_location);

        let mut criteria = SearchCriteria::new(term, location)
            .with_categories(self.categories.iter().cloned())
            .with_deals_only(self.deals);
        if let Some(sort) = self.sort {
            criteria = criteria.with_sort(sort);
        }
        if let Some(radius) = self.radius {
            criteria = criteria.with_radius_meters(radius);
        }
        criteria
    }
}

/// Loads up to `args.pages` pages, applies the name filter and prints the
/// visible list.
///
/// # Errors
///
/// Returns an error if any page fetch fails.
pub(crate) async fn run_search(
    client: &SearchClient,
    config: &AppConfig,
    args: &SearchArgs,
) -> anyhow::Result<()> {
    let mut session = Session::new(args.criteria(config), config.page_limit);

    for page in 1..=args.pages {
        if session.load_next_page(client).await?.is_none() {
            break;
        }
        tracing::info!(page, loaded = session.results().len(), "page loaded");
        if session.is_exhausted() {
            break;
        }
    }

    if let Some(text) = &args.filter {
        session.set_query(text);
        if !session.filter_state().active {
            println!("filter '{text}' does not narrow the results; showing all");
        }
    }

    let list = session.current_list();
    if list.is_empty() {
        println!("no listings found for '{}'", session.criteria().term);
        return Ok(());
    }

    println!(
        "{} of {} listings{}",
        list.len(),
        session.results().len(),
        if session.is_exhausted() { "" } else { " (more available)" }
    );
    for item in list {
        println!("{}", format_listing(item));
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the reviews request fails.
pub(crate) async fn run_reviews(client: &SearchClient, id: &ItemId) -> anyhow::Result<()> {
    let reviews = client.business_reviews(id).await?;
    if reviews.is_empty() {
        println!("no reviews for {id}");
        return Ok(());
    }
    for review in &reviews {
        println!("{}", format_review(review));
    }
    Ok(())
}

pub(crate) fn format_listing(item: &Item) -> String {
    let mut line = format!("{:<24}{}", item.id.as_str(), item.name);
    let details: Vec<String> = [
        item.address.clone(),
        item.categories.clone(),
        item.distance.clone(),
        item.review_count.map(|n| format!("{n} reviews")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !details.is_empty() {
        line.push_str("  [");
        line.push_str(&details.join(" | "));
        line.push(']');
    }
    line
}

pub(crate) fn format_review(review: &Review) -> String {
    let mut header = format!("{:.1}/5 {}", review.rating, review.user_name);
    if let Some(at) = review.created_at {
        header.push_str(&at.format(" %Y-%m-%d").to_string());
    }
    format!("{header}\n    {}", review.excerpt)
}
