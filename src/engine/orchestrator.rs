use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use crate::config::types::EngineConfig;
use crate::domain::calendar::CellRef;
use crate::domain::month::MonthToken;
use crate::domain::quote::{Quote, SearchResult};
use crate::domain::search_params::{SearchRequest, StayPolicy};
use crate::engine::best_price::select_best;
use crate::engine::candidates::{self, Candidate};
use crate::engine::navigation::MonthNavigator;
use crate::engine::quote_extractor::QuoteExtractor;
use crate::engine::selection::DateSelector;
use crate::error::{FlexstayError, Result};
use crate::ports::calendar_surface::CalendarSurface;

/// What became of one probed stay.
#[derive(Debug)]
enum Probe {
    Quoted(Quote),
    /// The stay could not be selected, or the surface misbehaved while it was.
    Invalid(FlexstayError),
    /// Both days were selected but no price rendered.
    NoQuote(FlexstayError),
}

/// Walks the requested months of one listing calendar and collects a quote
/// for every legal stay.
pub struct SearchOrchestrator<'a> {
    surface: &'a dyn CalendarSurface,
    config: &'a EngineConfig,
    today: NaiveDate,
}

impl<'a> SearchOrchestrator<'a> {
    pub fn new(surface: &'a dyn CalendarSurface, config: &'a EngineConfig, today: NaiveDate) -> Self {
        Self {
            surface,
            config,
            today,
        }
    }

    fn navigator(&self) -> MonthNavigator<'a> {
        MonthNavigator::new(self.surface, self.config)
    }

    fn selector(&self) -> DateSelector<'a> {
        DateSelector::new(self.surface, self.config)
    }

    /// Collect quotes for `months`, in the order given. Stays that start in
    /// one month and end in the next are probed only when the next requested
    /// month directly follows it.
    ///
    /// Fails only on errors fatal to the listing, such as a month that cannot
    /// be reached. Anything else costs at most the stay being tried.
    pub async fn run(&self, policy: StayPolicy, months: &[MonthToken]) -> Result<Vec<Quote>> {
        let navigator = self.navigator();
        let mut quotes = Vec::new();

        self.clear_quietly().await?;

        for (index, &month) in months.iter().enumerate() {
            let shown = navigator.navigate_to(month, self.today).await?;
            let grid = match self.surface.read_month().await {
                Ok(grid) => grid,
                Err(e) if !e.is_fatal_to_listing() => {
                    warn!(month = %shown, error = %e, "Could not read month, skipping");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let found = candidates::enumerate(policy, &grid);
            info!(
                month = %shown,
                %policy,
                same_month = found.same_month.len(),
                cross_month = found.cross_month.len(),
                "Probing month"
            );

            for candidate in &found.same_month {
                if let Some(quote) = self.probe_same_month(candidate).await? {
                    quotes.push(quote);
                }
            }

            let Some(&next) = months.get(index + 1) else {
                continue;
            };
            if !month.is_followed_by(next) || found.cross_month.is_empty() {
                continue;
            }
            for candidate in &found.cross_month {
                if let Some(quote) = self.probe_cross_month(candidate, month, next).await? {
                    quotes.push(quote);
                }
            }
        }

        info!(quotes = quotes.len(), "Calendar walk finished");
        Ok(quotes)
    }

    async fn probe_same_month(&self, candidate: &Candidate) -> Result<Option<Quote>> {
        let probe = recover(self.select_same_month(candidate).await)?;
        self.clear_quietly().await?;
        tokio::time::sleep(self.config.probe_gap()).await;
        Ok(log_probe(candidate, probe))
    }

    async fn select_same_month(&self, candidate: &Candidate) -> Result<Probe> {
        let selector = self.selector();
        if !selector.select_day(candidate.check_in).await? {
            return Ok(Probe::Invalid(invalid(candidate.check_in)));
        }
        tokio::time::sleep(self.config.checkout_click_delay()).await;
        if !selector.select_day(candidate.check_out).await? {
            return Ok(Probe::Invalid(invalid(candidate.check_out)));
        }
        self.read_quote().await
    }

    /// Check in on `month`, step to `next` to check out, then come back so
    /// the walk can continue where it was.
    async fn probe_cross_month(
        &self,
        candidate: &Candidate,
        month: MonthToken,
        next: MonthToken,
    ) -> Result<Option<Quote>> {
        let probe = recover(self.select_across(candidate, next).await)?;
        self.clear_quietly().await?;
        // No-op when the check-in never took and the calendar stayed put.
        self.navigator().navigate_backward(month).await?;
        tokio::time::sleep(self.config.probe_gap()).await;
        Ok(log_probe(candidate, probe))
    }

    async fn select_across(&self, candidate: &Candidate, next: MonthToken) -> Result<Probe> {
        let selector = self.selector();
        if !selector.select_day(candidate.check_in).await? {
            return Ok(Probe::Invalid(invalid(candidate.check_in)));
        }
        self.navigator().navigate_forward(next).await?;
        tokio::time::sleep(self.config.checkout_click_delay()).await;
        if !selector.select_day(candidate.check_out).await? {
            return Ok(Probe::Invalid(invalid(candidate.check_out)));
        }
        self.read_quote().await
    }

    async fn read_quote(&self) -> Result<Probe> {
        let extractor = QuoteExtractor::new(self.surface, self.config);
        Ok(match extractor.extract_quote().await? {
            Some(quote) => Probe::Quoted(quote),
            None => Probe::NoQuote(FlexstayError::QuoteTimeout {
                attempts: self.config.max_quote_poll_attempts,
            }),
        })
    }

    /// Reset the picked range. A surface that cannot be cleared right now
    /// does not end the walk; the next click starts a new range anyway.
    async fn clear_quietly(&self) -> Result<()> {
        match self.selector().clear_selection().await {
            Ok(_) => Ok(()),
            Err(e) if !e.is_fatal_to_listing() => {
                warn!(error = %e, "Could not clear selection");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Candidate-level failures become an invalid probe; anything else ends the listing.
fn recover(attempt: Result<Probe>) -> Result<Probe> {
    match attempt {
        Err(e) if !e.is_fatal_to_listing() => Ok(Probe::Invalid(e)),
        other => other,
    }
}

fn invalid(at: CellRef) -> FlexstayError {
    FlexstayError::SelectionInvalid {
        week: at.week,
        day: at.day,
    }
}

fn log_probe(candidate: &Candidate, probe: Probe) -> Option<Quote> {
    match probe {
        Probe::Quoted(quote) => {
            debug!(dates = %quote.date_range, price = %quote.total_price, "Collected quote");
            Some(quote)
        }
        Probe::Invalid(e) => {
            debug!(?candidate, error = %e, "Stay skipped");
            None
        }
        Probe::NoQuote(e) => {
            debug!(?candidate, error = %e, "No price for stay");
            None
        }
    }
}

/// Run a full search for `request` on `surface` and pick the cheapest stay.
///
/// Never fails: navigation and surface errors are folded into the result.
pub async fn search_listing(
    surface: &dyn CalendarSurface,
    config: &EngineConfig,
    request: &SearchRequest,
    today: NaiveDate,
) -> SearchResult {
    let Some(policy) = request.policy() else {
        warn!(listing = %request.listing, "Month-long stays are not searched");
        return SearchResult::empty();
    };

    let orchestrator = SearchOrchestrator::new(surface, config, today);
    match orchestrator.run(policy, &request.months).await {
        Ok(quotes) => select_best(&quotes),
        Err(e) => {
            error!(listing = %request.listing, error = %e, "Search aborted");
            SearchResult::failed(e.to_string())
        }
    }
}
