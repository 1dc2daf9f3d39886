use glycowatch::{HistoryFilter, HistorySummary, ProbabilityBucket};
use glycowatch_shared::date::{display_timestamp, parse_date_input};
use glycowatch_shared::{PredictionHistoryRecord, RiskLevel};
use leptos::prelude::*;

use crate::components::prediction_panel::risk_badge_class;

/// Empty or unparseable input clears the bound.
fn parse_bound(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[component]
fn SummaryStat(title: &'static str, value: Signal<String>) -> impl IntoView {
    view! {
        <div class="stat">
            <div class="stat-title">{title}</div>
            <div class="stat-value text-2xl">{value}</div>
        </div>
    }
}

#[component]
pub fn HistoryTable(history: Signal<Vec<PredictionHistoryRecord>>) -> impl IntoView {
    let filter = RwSignal::new(HistoryFilter::default());
    // typed text; the filter only keeps the parsed bound
    let glucose_min_raw = RwSignal::new(String::new());
    let glucose_max_raw = RwSignal::new(String::new());

    let filtered = Memo::new(move |_| filter.with(|f| history.with(|h| f.apply(h))));
    let summary = Memo::new(move |_| filtered.with(|rows| HistorySummary::of(rows)));

    let stat = move |f: fn(&HistorySummary) -> String| Signal::derive(move || summary.with(f));

    let on_risk = move |ev: leptos::ev::Event| {
        let value = event_target_value(&ev);
        filter.update(|f| {
            f.risk = (value != "all").then(|| RiskLevel::parse(&value));
        });
    };
    let on_date = move |ev: leptos::ev::Event| {
        let value = event_target_value(&ev);
        filter.update(|f| f.date = parse_date_input(&value));
    };
    let on_probability = move |ev: leptos::ev::Event| {
        let bucket = event_target_value(&ev).parse().unwrap_or_default();
        filter.update(|f| f.probability = bucket);
    };
    let on_glucose_min = move |ev: leptos::ev::Event| {
        let raw = event_target_value(&ev);
        filter.update(|f| f.glucose_min = parse_bound(&raw));
        glucose_min_raw.set(raw);
    };
    let on_glucose_max = move |ev: leptos::ev::Event| {
        let raw = event_target_value(&ev);
        filter.update(|f| f.glucose_max = parse_bound(&raw));
        glucose_max_raw.set(raw);
    };
    let on_clear = move |_| {
        filter.update(HistoryFilter::clear);
        glucose_min_raw.set(String::new());
        glucose_max_raw.set(String::new());
    };

    let risk_value = move || {
        filter.with(|f| f.risk.as_ref().map_or("all".to_string(), |r| r.as_str().to_string()))
    };
    let date_value = move || filter.with(|f| f.date.map(|d| d.to_string()).unwrap_or_default());

    let rows = move || {
        filtered
            .get()
            .into_iter()
            .map(|record| {
                let glucose = record
                    .glucose()
                    .map_or("N/A".to_string(), |g| format!("{:.0}", g));
                view! {
                    <tr>
                        <td>{display_timestamp(&record.timestamp)}</td>
                        <td>
                            <span class=risk_badge_class(&record.risk_level)>
                                {record.risk_level.to_string()}
                            </span>
                        </td>
                        <td>{format!("{:.1}%", record.probability * 100.0)}</td>
                        <td class="hidden md:table-cell">{glucose}</td>
                    </tr>
                }
            })
            .collect_view()
    };

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body">
                <div class="flex items-center justify-between">
                    <h3 class="card-title">"Prediction history"</h3>
                    <Show when=move || filter.with(HistoryFilter::is_active)>
                        <button class="btn btn-ghost btn-sm" on:click=on_clear>
                            "Clear filters"
                        </button>
                    </Show>
                </div>

                <div class="stats stats-vertical md:stats-horizontal shadow">
                    <SummaryStat title="Records" value=stat(|s| s.total.to_string()) />
                    <SummaryStat title="Low risk" value=stat(|s| s.low_risk.to_string()) />
                    <SummaryStat title="High risk" value=stat(|s| s.high_risk.to_string()) />
                    <SummaryStat
                        title="Average probability"
                        value=stat(|s| format!("{:.0}%", s.average_probability * 100.0))
                    />
                </div>

                <div class="grid grid-cols-1 md:grid-cols-5 gap-3 mt-4">
                    <select class="select select-bordered" on:change=on_risk prop:value=risk_value>
                        <option value="all">"All risk levels"</option>
                        {RiskLevel::KNOWN
                            .iter()
                            .map(|level| view! { <option value=level.as_str().to_string()>{level.as_str().to_string()}</option> })
                            .collect_view()}
                    </select>
                    <input type="date" class="input input-bordered" on:change=on_date prop:value=date_value />
                    <select
                        class="select select-bordered"
                        on:change=on_probability
                        prop:value=move || filter.with(|f| f.probability.as_str())
                    >
                        <option value=ProbabilityBucket::All.as_str()>"Any probability"</option>
                        <option value=ProbabilityBucket::High.as_str()>"High (≥ 70%)"</option>
                        <option value=ProbabilityBucket::Medium.as_str()>"Medium (30-70%)"</option>
                        <option value=ProbabilityBucket::Low.as_str()>"Low (< 30%)"</option>
                    </select>
                    <input
                        type="number"
                        placeholder="Min glucose"
                        class="input input-bordered"
                        on:input=on_glucose_min
                        prop:value=glucose_min_raw
                    />
                    <input
                        type="number"
                        placeholder="Max glucose"
                        class="input input-bordered"
                        on:input=on_glucose_max
                        prop:value=glucose_max_raw
                    />
                </div>

                <div class="overflow-x-auto w-full mt-4">
                    <table class="table table-zebra w-full">
                        <thead>
                            <tr>
                                <th>"Time"</th>
                                <th>"Risk"</th>
                                <th>"Probability"</th>
                                <th class="hidden md:table-cell">"Glucose"</th>
                            </tr>
                        </thead>
                        <tbody>
                            <Show when=move || filtered.with(|rows| rows.is_empty())>
                                <tr>
                                    <td colspan="4" class="text-center py-8 text-base-content/50">
                                        "No predictions match."
                                    </td>
                                </tr>
                            </Show>
                            {rows}
                        </tbody>
                    </table>
                </div>
            </div>
        </div>
    }
}
