//! Display formatting: turns a fetched page into a [`SearchResult`].

use serde_json::Value;

use crate::{
    Breakdown, DisplayMode, Entry, FacetCount, Projection, ResourceType, ResultStats, SampleSize, SearchId,
    SearchResult, Timestamp,
};

/// How many values each breakdown list keeps.
pub const BREAKDOWN_TOP_N: usize = 5;

const UNKNOWN: &str = "Unknown";

/// Identifies the search a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultHeader {
    pub id: SearchId,
    pub resource: ResourceType,
    pub display: DisplayMode,
}

/// Applies a display mode to a page of raw entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayFormatter {
    sample_size: SampleSize,
}

impl DisplayFormatter {
    pub fn new(sample_size: SampleSize) -> Self {
        Self { sample_size }
    }

    pub fn sample_size(&self) -> SampleSize {
        self.sample_size
    }

    /// The raw entries a mode returns: none, the first `sample_size`, or all.
    pub fn select<'a>(&self, display: DisplayMode, entries: &'a [Entry]) -> &'a [Entry] {
        match display {
            DisplayMode::Summary => &[],
            DisplayMode::ShowN => &entries[..entries.len().min(self.sample_size.get())],
            DisplayMode::All => entries,
        }
    }

    /// Builds the envelope. Only the selected entries are projected, so a
    /// summary never touches the projector.
    pub fn assemble(
        &self,
        header: ResultHeader,
        stats: ResultStats,
        breakdown: Breakdown,
        page: &[Entry],
        projection: &Projection,
    ) -> SearchResult {
        let entries = self
            .select(header.display, page)
            .iter()
            .map(|entry| projection.apply(entry))
            .collect();

        SearchResult {
            id: header.id,
            timestamp: Timestamp::now(),
            resource: header.resource,
            display: header.display,
            stats,
            breakdown,
            entries,
        }
    }
}

/// Most frequent companies, categories, locations, and job types on a page of
/// jobs. Other resources have no related entities and get an empty breakdown.
pub fn breakdown(resource: ResourceType, entries: &[Entry]) -> Breakdown {
    if resource != ResourceType::Job {
        return Breakdown::default();
    }
    Breakdown {
        companies: top_values(entries, "company"),
        categories: top_values(entries, "category"),
        locations: top_values(entries, "location"),
        job_types: top_values(entries, "jobtype"),
    }
}

/// Counts `entry[field].name` across entries. Missing names count as
/// `"Unknown"`; ties keep first-seen order.
fn top_values(entries: &[Entry], field: &str) -> Vec<FacetCount> {
    let mut counts: Vec<FacetCount> = Vec::new();
    for entry in entries {
        let name = match entry.get(field).and_then(|v| v.get("name")) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => UNKNOWN.to_owned(),
            Some(other) => other.to_string(),
        };
        match counts.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.count += 1,
            None => counts.push(FacetCount { name, count: 1 }),
        }
    }
    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(BREAKDOWN_TOP_N);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldPath;
    use serde_json::json;

    fn jobs(n: usize) -> Vec<Entry> {
        (0..n)
            .map(|i| {
                json!({"id": i, "title": format!("Job {i}"), "company": {"name": format!("Co {}", i % 2)}})
                    .as_object()
                    .cloned()
                    .unwrap()
            })
            .collect()
    }

    fn stats(fetched: usize) -> ResultStats {
        ResultStats {
            total: fetched as u64,
            page: 1,
            limit: 30,
            total_pages: None,
            fetched,
        }
    }

    fn header(display: DisplayMode) -> ResultHeader {
        ResultHeader {
            id: SearchId::new_random(),
            resource: ResourceType::Job,
            display,
        }
    }

    fn title_only() -> Projection {
        Projection::new(vec![FieldPath::parse("title").unwrap()])
    }

    #[test]
    fn summary_has_no_entries() {
        let page = jobs(10);
        let result = DisplayFormatter::default().assemble(
            header(DisplayMode::Summary),
            stats(10),
            Breakdown::default(),
            &page,
            &title_only(),
        );
        assert!(result.entries.is_empty());
        assert_eq!(result.stats.total, 10);
    }

    #[test]
    fn show_n_caps_at_sample_size_and_page_size() {
        let formatter = DisplayFormatter::new(SampleSize::new(5).unwrap());
        assert_eq!(formatter.select(DisplayMode::ShowN, &jobs(10)).len(), 5);
        assert_eq!(formatter.select(DisplayMode::ShowN, &jobs(3)).len(), 3);
        assert_eq!(formatter.select(DisplayMode::ShowN, &[]).len(), 0);
    }

    #[test]
    fn all_returns_every_entry_projected() {
        let page = jobs(7);
        let result = DisplayFormatter::default().assemble(
            header(DisplayMode::All),
            stats(7),
            Breakdown::default(),
            &page,
            &title_only(),
        );
        assert_eq!(result.entries.len(), 7);
        for (i, entry) in result.entries.iter().enumerate() {
            assert_eq!(Value::Object(entry.clone()), json!({"title": format!("Job {i}")}));
        }
    }

    #[test]
    fn breakdown_counts_and_orders_job_facets() {
        let mut page = jobs(5);
        page.push(json!({"id": 99, "company": null}).as_object().cloned().unwrap());
        let b = breakdown(ResourceType::Job, &page);
        assert_eq!(
            b.companies,
            vec![
                FacetCount { name: "Co 0".into(), count: 3 },
                FacetCount { name: "Co 1".into(), count: 2 },
                FacetCount { name: UNKNOWN.into(), count: 1 },
            ]
        );
        assert_eq!(b.locations, vec![FacetCount { name: UNKNOWN.into(), count: 6 }]);
    }

    #[test]
    fn breakdown_keeps_top_five() {
        let page: Vec<Entry> = (0..8)
            .map(|i| json!({"category": {"name": format!("Cat {i}")}}).as_object().cloned().unwrap())
            .collect();
        let b = breakdown(ResourceType::Job, &page);
        assert_eq!(b.categories.len(), BREAKDOWN_TOP_N);
        assert_eq!(b.categories[0].name, "Cat 0");
    }

    #[test]
    fn breakdown_is_empty_for_non_job_resources() {
        assert!(breakdown(ResourceType::Company, &jobs(3)).is_empty());
    }
}
