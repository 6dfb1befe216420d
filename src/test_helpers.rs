use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};

use crate::domain::calendar::{CellRef, DayCell, DisplayedMonth};
use crate::domain::listing::ListingRef;
use crate::domain::month::{MonthToken, YearMonth};
use crate::domain::search_params::{FilterMode, PriceBounds, SearchRequest, TripLength};
use crate::error::{FlexstayError, Result};
use crate::ports::automation_host::{AutomationHost, TargetId};
use crate::ports::calendar_surface::{CalendarSurface, NavDirection, QuoteLabels};
use crate::ports::listing_feed::ListingFeed;
use crate::ports::price_sink::{PriceSink, PriceSnapshot};

/// Something the fake calendar was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarEvent {
    Navigated(YearMonth),
    Clicked(NaiveDate),
    Cleared,
}

struct CalendarState {
    months: Vec<(YearMonth, DisplayedMonth)>,
    current: usize,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
    prices: HashMap<(NaiveDate, NaiveDate), u32>,
    quote_reads: u32,
    render_after_reads: u32,
    stuck: bool,
    not_ready: bool,
    failing_quote_reads: u32,
    failing_clicks: HashSet<NaiveDate>,
    events: Vec<CalendarEvent>,
}

impl CalendarState {
    fn date_at(&self, month: usize, at: CellRef) -> Option<NaiveDate> {
        let (ym, grid) = self.months.get(month)?;
        grid.cell(at)?;
        let first = ym.first_day()?;
        let lead = first.weekday().num_days_from_sunday() as usize;
        let offset = at.position().checked_sub(lead)?;
        Some(first + chrono::Days::new(offset as u64))
    }
}

/// In-memory availability calendar spanning consecutive months, laid out the
/// way the real widget is.
pub struct FakeCalendar {
    state: Mutex<CalendarState>,
}

impl FakeCalendar {
    /// `count` consecutive months starting at `start`, each day rendered by `cell_for`.
    pub fn new(start: YearMonth, count: usize, cell_for: impl Fn(NaiveDate) -> DayCell) -> Self {
        let mut months = Vec::with_capacity(count);
        let mut ym = start;
        for _ in 0..count {
            months.push((ym, DisplayedMonth::layout(ym, &cell_for)));
            ym = ym.next();
        }
        Self {
            state: Mutex::new(CalendarState {
                months,
                current: 0,
                check_in: None,
                check_out: None,
                prices: HashMap::new(),
                quote_reads: 0,
                render_after_reads: 1,
                stuck: false,
                not_ready: false,
                failing_quote_reads: 0,
                failing_clicks: HashSet::new(),
                events: Vec::new(),
            }),
        }
    }

    /// Every day open for check-in, no minimum stay.
    pub fn open(start: YearMonth, count: usize) -> Self {
        Self::new(start, count, |_| DayCell::open())
    }

    #[must_use]
    pub fn showing(self, month: YearMonth) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let index = state
                .months
                .iter()
                .position(|(ym, _)| *ym == month)
                .expect("month not part of the fake calendar");
            state.current = index;
        }
        self
    }

    /// Render `total` once `check_in`..`check_out` is selected.
    #[must_use]
    pub fn with_price(self, check_in: NaiveDate, check_out: NaiveDate, total: u32) -> Self {
        self.state
            .lock()
            .unwrap()
            .prices
            .insert((check_in, check_out), total);
        self
    }

    /// Quote labels only appear on the `reads`-th poll after a stay is selected.
    #[must_use]
    pub fn render_after(self, reads: u32) -> Self {
        self.state.lock().unwrap().render_after_reads = reads;
        self
    }

    /// Navigation clicks are accepted but the month never changes.
    #[must_use]
    pub fn stuck(self) -> Self {
        self.state.lock().unwrap().stuck = true;
        self
    }

    /// No month container is rendered.
    #[must_use]
    pub fn not_ready(self) -> Self {
        self.state.lock().unwrap().not_ready = true;
        self
    }

    /// The next `reads` booking panel reads fail as not rendered.
    #[must_use]
    pub fn failing_quote_reads(self, reads: u32) -> Self {
        self.state.lock().unwrap().failing_quote_reads = reads;
        self
    }

    /// Clicking `day` fails as if its cell vanished mid-render.
    #[must_use]
    pub fn failing_click(self, day: NaiveDate) -> Self {
        self.state.lock().unwrap().failing_clicks.insert(day);
        self
    }

    pub fn current_month(&self) -> YearMonth {
        let state = self.state.lock().unwrap();
        state.months[state.current].0
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn selection(&self) -> (Option<NaiveDate>, Option<NaiveDate>) {
        let state = self.state.lock().unwrap();
        (state.check_in, state.check_out)
    }
}

#[async_trait]
impl CalendarSurface for FakeCalendar {
    async fn read_month(&self) -> Result<DisplayedMonth> {
        let state = self.state.lock().unwrap();
        if state.not_ready {
            return Err(FlexstayError::SurfaceNotReady {
                reason: "Calendar container not found".into(),
            });
        }
        Ok(state.months[state.current].1.clone())
    }

    async fn click_navigation(&self, direction: NavDirection) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        if state.stuck {
            return Ok(true);
        }
        let target = match direction {
            NavDirection::Forward => state.current + 1,
            NavDirection::Backward => match state.current.checked_sub(1) {
                Some(i) => i,
                None => return Ok(false),
            },
        };
        if target >= state.months.len() {
            return Ok(false);
        }
        state.current = target;
        let shown = state.months[target].0;
        state.events.push(CalendarEvent::Navigated(shown));
        Ok(true)
    }

    async fn click_day(&self, week: usize, day: usize) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let at = CellRef::new(week, day);
        let current = state.current;
        let selectable = state.months[current]
            .1
            .cell(at)
            .is_some_and(|c| c.selectable);
        let Some(date) = state.date_at(current, at).filter(|_| selectable) else {
            return Ok(false);
        };
        if state.failing_clicks.contains(&date) {
            return Err(FlexstayError::SurfaceNotReady {
                reason: format!("day cell for {date} detached"),
            });
        }
        match (state.check_in, state.check_out) {
            (Some(check_in), None) if date > check_in => state.check_out = Some(date),
            _ => {
                state.check_in = Some(date);
                state.check_out = None;
            }
        }
        state.quote_reads = 0;
        state.events.push(CalendarEvent::Clicked(date));
        Ok(true)
    }

    async fn read_quote_labels(&self) -> Result<QuoteLabels> {
        let mut state = self.state.lock().unwrap();
        if state.failing_quote_reads > 0 {
            state.failing_quote_reads -= 1;
            return Err(FlexstayError::SurfaceNotReady {
                reason: "booking panel not rendered".into(),
            });
        }
        let (Some(check_in), Some(check_out)) = (state.check_in, state.check_out) else {
            return Ok(QuoteLabels::default());
        };
        let Some(total) = state.prices.get(&(check_in, check_out)).copied() else {
            return Ok(QuoteLabels::default());
        };
        state.quote_reads += 1;
        if state.quote_reads < state.render_after_reads {
            return Ok(QuoteLabels::default());
        }
        Ok(QuoteLabels {
            date_range: Some(format!(
                "{} - {}",
                check_in.format("%b %-d, %Y"),
                check_out.format("%b %-d, %Y")
            )),
            total_price: Some(format_dollars(total)),
        })
    }

    async fn clear_dates(&self) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        if state.check_in.is_none() {
            return Ok(false);
        }
        state.check_in = None;
        state.check_out = None;
        state.quote_reads = 0;
        state.events.push(CalendarEvent::Cleared);
        Ok(true)
    }
}

pub fn format_dollars(amount: u32) -> String {
    let digits = amount.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("${out}")
}

/// Something the fake host was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Opened(String),
    Activated(TargetId),
    Closed(TargetId),
}

struct HostState {
    calendars: HashMap<String, Arc<FakeCalendar>>,
    failing_links: HashSet<String>,
    targets: HashMap<TargetId, String>,
    foreground: Option<TargetId>,
    next_id: usize,
    max_open: usize,
    events: Vec<HostEvent>,
}

/// Browser stand-in: every opened link gets the calendar registered for it.
pub struct FakeHost {
    state: Mutex<HostState>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HostState {
                calendars: HashMap::new(),
                failing_links: HashSet::new(),
                targets: HashMap::new(),
                foreground: Some(TargetId("results".into())),
                next_id: 0,
                max_open: 0,
                events: Vec::new(),
            }),
        }
    }

    #[must_use]
    pub fn with_calendar(self, link: &str, calendar: Arc<FakeCalendar>) -> Self {
        self.state
            .lock()
            .unwrap()
            .calendars
            .insert(link.to_string(), calendar);
        self
    }

    /// Opening `link` fails.
    #[must_use]
    pub fn failing(self, link: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_links
            .insert(link.to_string());
        self
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn open_count(&self) -> usize {
        self.state.lock().unwrap().targets.len()
    }

    /// Most targets that were ever open at the same time.
    pub fn max_open(&self) -> usize {
        self.state.lock().unwrap().max_open
    }

    pub fn foreground_now(&self) -> Option<TargetId> {
        self.state.lock().unwrap().foreground.clone()
    }
}

#[async_trait]
impl AutomationHost for FakeHost {
    async fn open_target(&self, link: &str) -> Result<TargetId> {
        let mut state = self.state.lock().unwrap();
        state.events.push(HostEvent::Opened(link.to_string()));
        if state.failing_links.contains(link) {
            return Err(FlexstayError::DispatchFailure {
                reason: format!("could not open {link}"),
            });
        }
        state.next_id += 1;
        let id = TargetId(format!("tab-{}", state.next_id));
        state.targets.insert(id.clone(), link.to_string());
        state.max_open = state.max_open.max(state.targets.len());
        Ok(id)
    }

    async fn foreground(&self) -> Result<Option<TargetId>> {
        Ok(self.state.lock().unwrap().foreground.clone())
    }

    async fn activate(&self, target: &TargetId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.events.push(HostEvent::Activated(target.clone()));
        state.foreground = Some(target.clone());
        Ok(())
    }

    async fn close_target(&self, target: &TargetId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.events.push(HostEvent::Closed(target.clone()));
        state.targets.remove(target);
        if state.foreground.as_ref() == Some(target) {
            state.foreground = None;
        }
        Ok(())
    }

    fn surface(&self, target: &TargetId) -> Arc<dyn CalendarSurface> {
        let state = self.state.lock().unwrap();
        let link = state.targets.get(target).cloned().unwrap_or_default();
        match state.calendars.get(&link) {
            Some(calendar) => Arc::clone(calendar) as Arc<dyn CalendarSurface>,
            None => Arc::new(FakeCalendar::open(ym(2026, "june"), 1).not_ready()),
        }
    }
}

/// Collects every snapshot it is given.
#[derive(Default)]
pub struct RecordingSink {
    snapshots: Mutex<Vec<PriceSnapshot>>,
}

impl RecordingSink {
    pub fn snapshots(&self) -> Vec<PriceSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceSink for RecordingSink {
    async fn record(&self, snapshot: &PriceSnapshot) -> Result<()> {
        self.snapshots.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}

// --- Factory functions ---

pub fn ym(year: i32, month: &str) -> YearMonth {
    YearMonth::new(year, month.parse::<MonthToken>().unwrap())
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn months(names: &[&str]) -> Vec<MonthToken> {
    names.iter().map(|n| n.parse().unwrap()).collect()
}

pub fn make_listing(id: &str) -> ListingRef {
    ListingRef::new(
        format!("Listing {id}"),
        format!("https://www.airbnb.com/rooms/{id}"),
    )
    .unwrap()
}

pub fn make_nights_request(id: &str, nights: u32, month_names: &[&str]) -> SearchRequest {
    SearchRequest {
        listing: make_listing(id),
        mode: FilterMode::IgnoreFilters,
        nights,
        trip_length: None,
        months: months(month_names),
        price_bounds: PriceBounds::default(),
    }
}

pub fn make_weekend_request(id: &str, month_names: &[&str]) -> SearchRequest {
    SearchRequest {
        listing: make_listing(id),
        mode: FilterMode::RespectFilters,
        nights: 1,
        trip_length: Some(TripLength::WeekendTrip),
        months: months(month_names),
        price_bounds: PriceBounds::default(),
    }
}

/// Feed that always returns the same listings.
pub struct StaticFeed(pub Vec<ListingRef>);

#[async_trait]
impl ListingFeed for StaticFeed {
    async fn read_listings(&self) -> Result<Vec<ListingRef>> {
        Ok(self.0.clone())
    }
}
