use glycowatch_shared::SensorReading;
use leptos::prelude::*;

fn reading(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "N/A".to_string(),
    }
}

#[component]
fn Card(title: &'static str, unit: &'static str, value: Signal<String>) -> impl IntoView {
    view! {
        <div class="stat bg-base-100 rounded-box shadow">
            <div class="stat-title">{title}</div>
            <div class="stat-value text-2xl">
                {value} " " <span class="text-base text-base-content/60">{unit}</span>
            </div>
        </div>
    }
}

/// Latest ThingSpeak values plus the profile BMI.
#[component]
pub fn SensorCards(sensor: Signal<Option<SensorReading>>, bmi: Signal<Option<f64>>) -> impl IntoView {
    let field = move |pick: fn(&SensorReading) -> Option<f64>, decimals: usize| {
        Signal::derive(move || reading(sensor.with(|s| s.as_ref().and_then(pick)), decimals))
    };

    let updated = move || {
        sensor
            .with(|s| s.as_ref().and_then(|s| s.timestamp.clone()))
            .map(|ts| glycowatch_shared::date::display_timestamp(&ts))
    };

    view! {
        <div class="space-y-2">
            <div class="grid grid-cols-2 md:grid-cols-3 xl:grid-cols-6 gap-4">
                <Card title="Glucose" unit="mg/dL" value=field(|s| s.glucose, 0) />
                <Card title="Blood Pressure" unit="mm Hg" value=field(|s| s.blood_pressure, 0) />
                <Card title="Skin Thickness" unit="mm" value=field(|s| s.skin_thickness, 0) />
                <Card title="Insulin" unit="μU/mL" value=field(|s| s.insulin, 0) />
                <Card title="DPF" unit="" value=field(|s| s.diabetes_pedigree_function, 3) />
                <Card title="BMI" unit="kg/m²" value=Signal::derive(move || reading(bmi.get(), 1)) />
            </div>
            {move || updated().map(|ts| view! {
                <p class="text-xs text-base-content/60">"Last reading: " {ts}</p>
            })}
        </div>
    }
}
