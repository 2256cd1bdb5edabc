use axum::{
    extract::{RawQuery, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::filters::{
    decode, encode, FilterController, FilterFacet, FilterState, FilterUpdate, Navigator, SortBy,
    LISTING_PATH, MAX_RATING, RATING_THRESHOLDS,
};
use crate::models::{Coffee, FilterOptions, Pagination};
use crate::state::AppState;

use super::api::{load_filter_options, search_listing};
use super::page_query;

/// Navigator that turns the last navigation into a redirect response.
#[derive(Debug, Default)]
pub struct Redirector {
    location: Option<String>,
}

impl Redirector {
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn into_redirect(self) -> Option<Redirect> {
        self.location.map(|location| Redirect::to(&location))
    }
}

impl Navigator for Redirector {
    fn navigate(&mut self, location: &str) {
        self.location = Some(location.to_string());
    }
}

/// GET / - Redirect to the listing.
pub async fn index() -> Redirect {
    Redirect::to(LISTING_PATH)
}

/// GET /coffees?<filters>&page=N - Coffee listing.
pub async fn listing(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Html<String>, AppError> {
    let query = query.unwrap_or_default();
    let committed = decode(&query);
    let page = Page {
        committed_query: &query,
        committed: &committed,
        pending: &committed,
        panel_open: false,
    };
    Ok(Html(render(&state, &page).await?))
}

/// A filter panel interaction.
#[derive(Debug, Default, Deserialize)]
pub struct PanelForm {
    /// Query string of the listing the panel was opened from.
    #[serde(default)]
    pub committed: String,
    /// Pending filters, in query-string form.
    #[serde(default)]
    pub pending: String,
    #[serde(default)]
    pub op: String,
    pub facet: Option<String>,
    pub value: Option<String>,
    pub commit: Option<String>,
}

impl PanelForm {
    fn commit(&self) -> bool {
        matches!(self.commit.as_deref(), Some("true" | "on" | "1"))
    }
}

/// POST /coffees/filters - Apply one panel interaction to the pending filters.
///
/// Responds with a redirect when the filters were committed, otherwise
/// re-renders the listing with the pending panel.
pub async fn filter_panel(
    State(state): State<AppState>,
    Form(form): Form<PanelForm>,
) -> Result<Response, AppError> {
    let mut controller = FilterController::from_query(&form.pending, Redirector::default());
    controller.open_panel();
    apply_action(&mut controller, &form);

    let panel_open = controller.is_panel_open();
    let (pending, redirector) = controller.into_parts();
    if let Some(redirect) = redirector.into_redirect() {
        return Ok(redirect.into_response());
    }

    let committed = decode(&form.committed);
    let page = Page {
        committed_query: &form.committed,
        committed: &committed,
        pending: if panel_open { &pending } else { &committed },
        panel_open,
    };
    Ok(Html(render(&state, &page).await?).into_response())
}

fn apply_action<N: Navigator>(controller: &mut FilterController<N>, form: &PanelForm) {
    let value = form.value.as_deref();
    match form.op.as_str() {
        "toggle" => {
            let facet = form.facet.as_deref().and_then(FilterFacet::from_name);
            if let (Some(facet), Some(value)) = (facet, value) {
                controller.toggle_filter_value(facet, value);
            }
        }
        "search" => {
            controller.update_filter(FilterUpdate::Search(value.unwrap_or_default().to_string()))
        }
        "sort" => {
            if let Some(sort_by) = value.and_then(SortBy::parse) {
                controller.update_filter(FilterUpdate::SortBy(sort_by));
            }
        }
        "rating" => {
            let rating = value
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|r| r.is_finite() && (0.0..=MAX_RATING).contains(r));
            if let Some(rating) = rating {
                controller.update_filter(FilterUpdate::MinRating(rating));
            }
        }
        "apply" => controller.apply_filters(),
        "reset" => controller.reset_filters(),
        "open" => controller.open_panel(),
        "close" => controller.close_panel(),
        other => tracing::debug!("Ignoring unknown filter action: {}", other),
    }

    if form.commit() && !matches!(form.op.as_str(), "apply" | "reset" | "close") {
        controller.apply_filters();
    }
}

struct Page<'a> {
    committed_query: &'a str,
    committed: &'a FilterState,
    pending: &'a FilterState,
    panel_open: bool,
}

async fn render(state: &AppState, page: &Page<'_>) -> Result<String, AppError> {
    let paging = page_query(page.committed_query);
    let listing = search_listing(
        state,
        page.committed,
        paging.page.unwrap_or(1),
        state.page_size,
    )
    .await?;
    let options = load_filter_options(state).await?;

    let forms = Forms {
        committed_query: page.committed_query,
        committed: encode(page.committed),
        pending: encode(page.pending),
    };
    let panel = if page.panel_open {
        render_panel(&forms, page.pending, &options)
    } else {
        String::new()
    };

    Ok(format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Sipzy - Coffees</title>
    <link rel="stylesheet" href="/static/style.css">
</head>
<body>
    <header>
        <h1><a href="{listing_path}">Sipzy</a></h1>
    </header>
    <main>
        <section class="toolbar">
{toolbar}
        </section>
{badges}
{panel}
        <section class="results">
            <p class="result-count">{total} coffee{plural}</p>
            <ul class="cards">
{cards}
            </ul>
{pagination}
        </section>
    </main>
</body>
</html>"##,
        listing_path = LISTING_PATH,
        toolbar = render_toolbar(&forms, page.committed),
        badges = render_badges(&forms, page.committed),
        panel = panel,
        total = listing.pagination.total,
        plural = if listing.pagination.total == 1 { "" } else { "s" },
        cards = render_cards(&listing.data),
        pagination = render_pagination(&forms.committed, &listing.pagination),
    ))
}

/// Hidden state carried by every panel form.
struct Forms<'a> {
    committed_query: &'a str,
    /// Committed filters, for actions that commit right away.
    committed: String,
    pending: String,
}

impl Forms<'_> {
    fn open(&self, pending: &str, op: &str) -> String {
        format!(
            r#"<form method="post" action="{}/filters">{}{}{}"#,
            LISTING_PATH,
            hidden("committed", self.committed_query),
            hidden("pending", pending),
            hidden("op", op),
        )
    }

    /// A one-button form.
    fn button(&self, pending: &str, button: Button<'_>) -> String {
        let mut form = self.open(pending, button.op);
        if let Some(facet) = button.facet {
            form.push_str(&hidden("facet", facet.field_name()));
        }
        if let Some(value) = button.value {
            form.push_str(&hidden("value", value));
        }
        if button.commit {
            form.push_str(&hidden("commit", "true"));
        }
        form.push_str(&format!(
            r#"<button type="submit" class="{}">{}</button></form>"#,
            button.class, button.label
        ));
        form
    }
}

/// A panel action rendered as a submit button. `label` is raw HTML.
struct Button<'a> {
    op: &'a str,
    facet: Option<FilterFacet>,
    value: Option<&'a str>,
    commit: bool,
    class: &'a str,
    label: &'a str,
}

impl<'a> Button<'a> {
    fn new(op: &'a str, class: &'a str, label: &'a str) -> Self {
        Self {
            op,
            facet: None,
            value: None,
            commit: false,
            class,
            label,
        }
    }

    fn facet(mut self, facet: FilterFacet) -> Self {
        self.facet = Some(facet);
        self
    }

    fn value(mut self, value: &'a str) -> Self {
        self.value = Some(value);
        self
    }

    /// Commit the filters right after the action.
    fn commit(mut self) -> Self {
        self.commit = true;
        self
    }
}

fn render_toolbar(forms: &Forms<'_>, committed: &FilterState) -> String {
    let controller = FilterController::new(committed.clone(), Redirector::default());

    let search = format!(
        r#"{}{}<input type="search" name="value" value="{}" placeholder="Search coffees, origins, roasters"><button type="submit">Search</button></form>"#,
        forms.open(&forms.committed, "search"),
        hidden("commit", "true"),
        escape(committed.search()),
    );

    let sort_options: String = SortBy::ALL
        .iter()
        .map(|sort_by| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                sort_by.as_str(),
                if *sort_by == committed.sort_by() { " selected" } else { "" },
                sort_by.label()
            )
        })
        .collect();
    let sort = format!(
        r#"{}{}<select name="value">{}</select><button type="submit">Sort</button></form>"#,
        forms.open(&forms.committed, "sort"),
        hidden("commit", "true"),
        sort_options,
    );

    let filters_label = if controller.has_active_filters() {
        format!(
            r#"Filters <span class="count">{}</span>"#,
            controller.active_filters_count()
        )
    } else {
        "Filters".to_string()
    };
    let open = forms.button(
        &forms.committed,
        Button::new("open", "open-filters", &filters_label),
    );

    format!("            {}\n            {}\n            {}", search, sort, open)
}

fn render_badges(forms: &Forms<'_>, committed: &FilterState) -> String {
    if committed.is_default() {
        return String::new();
    }

    let mut badges = Vec::new();
    if !committed.search().is_empty() {
        let label = format!("&ldquo;{}&rdquo; &times;", escape(committed.search()));
        badges.push(forms.button(
            &forms.committed,
            Button::new("search", "badge", &label).value("").commit(),
        ));
    }
    for facet in FilterFacet::ALL {
        for value in committed.values(facet) {
            let label = format!("{}: {} &times;", facet.label(), escape(value));
            badges.push(forms.button(
                &forms.committed,
                Button::new("toggle", "badge", &label)
                    .facet(facet)
                    .value(value)
                    .commit(),
            ));
        }
    }
    if committed.min_rating() > 0.0 {
        let label = format!("{}+ &times;", committed.min_rating());
        badges.push(forms.button(
            &forms.committed,
            Button::new("rating", "badge", &label).value("0").commit(),
        ));
    }
    badges.push(forms.button(
        &forms.committed,
        Button::new("reset", "clear", "Clear all"),
    ));

    format!(
        "        <section class=\"active-filters\">\n            {}\n        </section>",
        badges.join("\n            ")
    )
}

fn render_panel(forms: &Forms<'_>, pending: &FilterState, options: &FilterOptions) -> String {
    let controller = FilterController::new(pending.clone(), Redirector::default());
    let mut groups = Vec::new();

    let sorts: String = SortBy::ALL
        .iter()
        .map(|sort_by| {
            let class = if *sort_by == pending.sort_by() { "option selected" } else { "option" };
            forms.button(
                &forms.pending,
                Button::new("sort", class, sort_by.label()).value(sort_by.as_str()),
            )
        })
        .collect();
    groups.push(panel_group("Sort by", &sorts));

    let ratings: String = RATING_THRESHOLDS
        .iter()
        .map(|threshold| {
            let class = if *threshold == pending.min_rating() { "option selected" } else { "option" };
            let label = if *threshold > 0.0 {
                format!("{}+", threshold)
            } else {
                "Any".to_string()
            };
            let value = threshold.to_string();
            forms.button(
                &forms.pending,
                Button::new("rating", class, &label).value(&value),
            )
        })
        .collect();
    groups.push(panel_group("Minimum rating", &ratings));

    for facet in FilterFacet::ALL {
        let values = match facet {
            FilterFacet::Origins => &options.origins,
            FilterFacet::Roasters => &options.roasters,
            FilterFacet::Notes => &options.notes,
            FilterFacet::Processes => &options.processes,
        };
        if values.is_empty() {
            continue;
        }
        let buttons: String = values
            .iter()
            .map(|value| {
                let class = if pending.contains(facet, value) { "option selected" } else { "option" };
                let label = escape(value);
                forms.button(
                    &forms.pending,
                    Button::new("toggle", class, &label).facet(facet).value(value),
                )
            })
            .collect();
        groups.push(panel_group(facet.label(), &buttons));
    }

    let apply_label = if controller.has_active_filters() {
        format!("Apply ({})", controller.active_filters_count())
    } else {
        "Apply".to_string()
    };

    format!(
        r#"        <section class="filter-panel">
            {}
            <div class="panel-actions">
                {}
                {}
                {}
            </div>
        </section>"#,
        groups.join("\n            "),
        forms.button(&forms.pending, Button::new("reset", "reset", "Reset")),
        forms.button(&forms.pending, Button::new("close", "close", "Close")),
        forms.button(&forms.pending, Button::new("apply", "apply", &apply_label)),
    )
}

fn panel_group(title: &str, body: &str) -> String {
    format!(
        r#"<fieldset class="panel-group"><legend>{}</legend>{}</fieldset>"#,
        title, body
    )
}

fn render_cards(coffees: &[Coffee]) -> String {
    if coffees.is_empty() {
        return r#"                <li class="empty">No coffees match these filters.</li>"#.to_string();
    }

    coffees
        .iter()
        .map(|coffee| {
            let rating = match coffee.average_rating {
                Some(r) => format!("{:.1} ({} reviews)", r, coffee.review_count),
                None => "Not rated yet".to_string(),
            };
            let details: Vec<String> = [coffee.origin.as_deref(), coffee.process.as_deref()]
                .into_iter()
                .flatten()
                .map(escape)
                .collect();
            let notes = coffee
                .notes
                .iter()
                .map(|n| format!(r#"<span class="note">{}</span>"#, escape(n)))
                .collect::<String>();
            format!(
                r#"                <li class="card">
                    <h2><a href="/api/coffees/{}">{}</a></h2>
                    <p class="roaster">{}</p>
                    <p class="details">{}</p>
                    <p class="rating">{}</p>
                    <p class="notes">{}</p>
                </li>"#,
                coffee.id,
                escape(&coffee.name),
                escape(&coffee.roaster.name),
                details.join(" &middot; "),
                rating,
                notes,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_pagination(committed: &str, pagination: &Pagination) -> String {
    if pagination.total_pages <= 1 {
        return String::new();
    }

    let link = |page: u32, label: &str| {
        let href = if committed.is_empty() {
            format!("{}?page={}", LISTING_PATH, page)
        } else {
            format!("{}?{}&page={}", LISTING_PATH, committed, page)
        };
        format!(r#"<a href="{}">{}</a>"#, escape(&href), label)
    };

    let mut parts = Vec::new();
    if pagination.has_prev {
        parts.push(link(pagination.page - 1, "Previous"));
    }
    parts.push(format!(
        r#"<span>Page {} of {}</span>"#,
        pagination.page, pagination.total_pages
    ));
    if pagination.has_next {
        parts.push(link(pagination.page + 1, "Next"));
    }
    format!(
        r#"            <nav class="pagination">{}</nav>"#,
        parts.join(" ")
    )
}

fn hidden(name: &str, value: &str) -> String {
    format!(
        r#"<input type="hidden" name="{}" value="{}">"#,
        name,
        escape(value)
    )
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pending: &str, op: &str, facet: Option<&str>, value: Option<&str>) -> PanelForm {
        PanelForm {
            committed: String::new(),
            pending: pending.to_string(),
            op: op.to_string(),
            facet: facet.map(str::to_string),
            value: value.map(str::to_string),
            commit: None,
        }
    }

    fn run(form: &PanelForm) -> (FilterState, bool, Option<String>) {
        let mut controller = FilterController::from_query(&form.pending, Redirector::default());
        controller.open_panel();
        apply_action(&mut controller, form);
        let open = controller.is_panel_open();
        let (pending, redirector) = controller.into_parts();
        (pending, open, redirector.location().map(str::to_string))
    }

    #[test]
    fn test_toggle_keeps_panel_open() {
        let (pending, open, location) =
            run(&form("origin=Ethiopia", "toggle", Some("origins"), Some("Kenya")));
        assert_eq!(pending.origins(), ["Ethiopia", "Kenya"]);
        assert!(open);
        assert_eq!(location, None);
    }

    #[test]
    fn test_commit_navigates() {
        let mut f = form("", "toggle", Some("origin"), Some("Kenya"));
        f.commit = Some("true".to_string());
        let (_, open, location) = run(&f);
        assert!(!open);
        assert_eq!(location.as_deref(), Some("/coffees?origin=Kenya"));
    }

    #[test]
    fn test_malformed_actions_leave_pending_unchanged() {
        let pending = "origin=Kenya&minRating=4";
        for f in [
            form(pending, "explode", None, None),
            form(pending, "toggle", Some("altitude"), Some("high")),
            form(pending, "toggle", Some("origins"), None),
            form(pending, "toggle", Some("origins"), Some("")),
            form(pending, "sort", None, Some("price")),
            form(pending, "rating", None, Some("9")),
            form(pending, "rating", None, Some("NaN")),
        ] {
            let (state, open, location) = run(&f);
            assert_eq!(state, decode(pending), "op {}", f.op);
            assert!(open);
            assert_eq!(location, None);
        }
    }

    #[test]
    fn test_close_discards_without_navigation() {
        let (_, open, location) = run(&form("origin=Kenya", "close", None, None));
        assert!(!open);
        assert_eq!(location, None);
    }

    #[test]
    fn test_reset_navigates_to_listing() {
        let (pending, _, location) = run(&form("origin=Kenya&sortBy=name", "reset", None, None));
        assert!(pending.is_default());
        assert_eq!(location.as_deref(), Some(LISTING_PATH));
    }

    #[test]
    fn test_button_form_fields() {
        let forms = Forms {
            committed_query: "origin=Kenya&page=2",
            committed: "origin=Kenya".to_string(),
            pending: String::new(),
        };

        let html = forms.button(
            &forms.committed,
            Button::new("toggle", "badge", "Kenya").facet(FilterFacet::Origins).value("Kenya").commit(),
        );
        assert_eq!(
            html,
            concat!(
                r#"<form method="post" action="/coffees/filters">"#,
                r#"<input type="hidden" name="committed" value="origin=Kenya&amp;page=2">"#,
                r#"<input type="hidden" name="pending" value="origin=Kenya">"#,
                r#"<input type="hidden" name="op" value="toggle">"#,
                r#"<input type="hidden" name="facet" value="origins">"#,
                r#"<input type="hidden" name="value" value="Kenya">"#,
                r#"<input type="hidden" name="commit" value="true">"#,
                r#"<button type="submit" class="badge">Kenya</button></form>"#,
            )
        );

        let html = forms.button(&forms.pending, Button::new("apply", "apply", "Apply"));
        assert!(!html.contains(r#"name="facet""#));
        assert!(!html.contains(r#"name="commit""#));
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<a href="x">Café & 'Co'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Café &amp; &#39;Co&#39;&lt;/a&gt;"
        );
    }
}
