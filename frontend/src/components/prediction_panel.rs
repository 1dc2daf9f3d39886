use glycowatch_shared::{PredictionResult, RiskLevel};
use leptos::prelude::*;

const MAX_PREGNANCIES: u32 = 20;

pub fn risk_badge_class(level: &RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "badge badge-success",
        RiskLevel::LowModerate => "badge badge-info",
        RiskLevel::Moderate => "badge badge-warning",
        RiskLevel::ModerateHigh | RiskLevel::High => "badge badge-error",
        RiskLevel::Other(_) => "badge badge-ghost",
    }
}

#[component]
pub fn PredictionPanel(
    pregnancies: Signal<u32>,
    on_pregnancies: Callback<u32>,
    predicting: Signal<bool>,
    /// A reading and a profile are loaded.
    can_predict: Signal<bool>,
    prediction: Signal<Option<PredictionResult>>,
    error: Signal<Option<String>>,
    on_predict: Callback<()>,
) -> impl IntoView {
    let on_input = move |ev: leptos::ev::Event| {
        // keep the last valid value while the field is being edited
        if let Ok(n) = event_target_value(&ev).trim().parse::<u32>() {
            on_pregnancies.run(n.min(MAX_PREGNANCIES));
        }
    };

    let result = move || {
        prediction.get().map(|p| {
            let features = p.features_used;
            view! {
                <div class="mt-4 space-y-2">
                    <div class="flex items-center gap-3">
                        <span class=risk_badge_class(&p.risk_level)>{p.risk_level.to_string()}</span>
                        <span class="text-3xl font-bold">{format!("{:.1}%", p.probability * 100.0)}</span>
                    </div>
                    <progress class="progress w-full" value=p.probability max="1"></progress>
                    <div class="text-xs text-base-content/60 grid grid-cols-2 gap-1">
                        <span>"Pregnancies: " {features.pregnancies}</span>
                        <span>"Glucose: " {format!("{:.0}", features.glucose)}</span>
                        <span>"Blood pressure: " {format!("{:.0}", features.blood_pressure)}</span>
                        <span>"BMI: " {format!("{:.1}", features.bmi)}</span>
                        <span>"Insulin: " {format!("{:.0}", features.insulin)}</span>
                        <span>"Age: " {features.age}</span>
                    </div>
                </div>
            }
        })
    };

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body">
                <h3 class="card-title">"Prediction"</h3>
                <div class="form-control">
                    <label class="label" for="pregnancies">
                        <span class="label-text">"Number of pregnancies"</span>
                    </label>
                    <input
                        id="pregnancies"
                        type="number"
                        min="0"
                        max=MAX_PREGNANCIES
                        class="input input-bordered"
                        prop:value=move || pregnancies.get().to_string()
                        on:input=on_input
                    />
                </div>
                <button
                    class="btn btn-primary mt-2"
                    disabled=move || predicting.get() || !can_predict.get()
                    on:click=move |_| on_predict.run(())
                >
                    {move || if predicting.get() {
                        view! { <span class="loading loading-spinner"></span> "Predicting..." }.into_any()
                    } else {
                        "Predict".into_any()
                    }}
                </button>
                {move || error.get().map(|msg| view! {
                    <div role="alert" class="alert alert-error text-sm py-2 mt-2">
                        <span>{msg}</span>
                    </div>
                })}
                {result}
            </div>
        </div>
    }
}
