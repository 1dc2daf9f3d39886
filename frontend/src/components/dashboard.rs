use std::time::Duration;

use glycowatch::config::REFRESH_INTERVAL_CHOICES;
use glycowatch::{DashboardState, Notification, NotificationKind, Phase};
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::auth::use_auth;
use crate::components::history_table::HistoryTable;
use crate::components::prediction_panel::PredictionPanel;
use crate::components::sensor_cards::SensorCards;

const TOAST_DURATION: Duration = Duration::from_secs(4);

fn toast_text(n: &Notification) -> String {
    match n.kind {
        NotificationKind::Success => format!(
            "{}: {:.1}% probability. Keep it up!",
            n.risk_level,
            n.probability * 100.0
        ),
        NotificationKind::Warning => format!(
            "{}: {:.1}% probability. Consider consulting a doctor.",
            n.risk_level,
            n.probability * 100.0
        ),
    }
}

/// Read-only view of one part of the dashboard state.
fn slice<T>(state: RwSignal<DashboardState>, f: fn(&DashboardState) -> T) -> Signal<T>
where
    T: Send + Sync + 'static,
{
    Signal::derive(move || state.with(f))
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let auth = use_auth();

    let controller = StoredValue::new_local(auth.dashboard());
    let state = RwSignal::new(controller.with_value(|c| c.snapshot()));
    controller.with_value(|c| c.subscribe(move |s: &DashboardState| state.set(s.clone())));

    spawn_local({
        let c = controller.get_value();
        async move { c.mount().await }
    });

    // 通知: 取出后显示一段时间
    let (toast, set_toast) = signal(Option::<Notification>::None);
    Effect::new(move |_| {
        if state.with(|s| s.notification.is_some()) {
            if let Some(n) = controller.with_value(|c| c.take_notification()) {
                set_toast.set(Some(n));
                set_timeout(move || set_toast.set(None), TOAST_DURATION);
            }
        }
    });

    let on_logout = move |_| controller.with_value(|c| c.logout());
    let on_refresh = move |_| {
        let c = controller.get_value();
        spawn_local(async move { c.refresh_sensor().await });
    };
    let on_predict = Callback::new(move |()| {
        let c = controller.get_value();
        spawn_local(async move { c.predict().await });
    });
    let on_pregnancies =
        Callback::new(move |n: u32| controller.with_value(|c| c.set_pregnancies(n)));
    let on_toggle_refresh = move |_| controller.with_value(|c| c.toggle_auto_refresh());
    let on_interval = move |ev: leptos::ev::Event| {
        if let Ok(secs) = event_target_value(&ev).parse::<u32>() {
            controller.with_value(|c| c.set_refresh_interval(secs));
        }
    };
    let on_auto_predict = move |ev: leptos::ev::Event| {
        let enabled = event_target_checked(&ev);
        controller.with_value(|c| c.set_auto_predict(enabled));
    };

    let auto_on = move || state.with(|s| s.auto_refresh.is_on());
    let header = move || {
        state.with(|s| {
            s.user.as_ref().map(|u| {
                let bmi = u.bmi().map_or("N/A".to_string(), |b| format!("{:.1}", b));
                format!("Welcome, {} | BMI: {} | Age: {}", u.username, bmi, u.age)
            })
        })
    };

    view! {
        <div class="min-h-screen bg-base-200 p-4 md:p-8 font-sans">
            <div class="max-w-7xl mx-auto space-y-8">
                {move || toast.get().map(|n| {
                    let class = match n.kind {
                        NotificationKind::Success => "alert alert-success shadow-lg",
                        NotificationKind::Warning => "alert alert-warning shadow-lg",
                    };
                    view! {
                        <div class="toast toast-top toast-end z-50">
                            <div class=class><span>{toast_text(&n)}</span></div>
                        </div>
                    }
                })}

                <div class="navbar bg-base-100 rounded-box shadow-xl">
                    <div class="flex-1 flex-col items-start">
                        <span class="text-xl font-bold px-4">"GlycoWatch Dashboard"</span>
                        <span class="text-sm text-base-content/70 px-4">{header}</span>
                    </div>
                    <div class="flex-none gap-2">
                        <button on:click=on_refresh class="btn btn-ghost">"Refresh"</button>
                        <button on:click=on_logout class="btn btn-outline btn-error">"Logout"</button>
                    </div>
                </div>

                <Show
                    when=move || state.with(|s| s.phase == Phase::Ready)
                    fallback=|| view! {
                        <div class="flex justify-center py-16">
                            <span class="loading loading-spinner loading-lg text-primary"></span>
                        </div>
                    }
                >
                    <div class="flex flex-wrap items-center gap-4 bg-base-100 rounded-box shadow p-4">
                        <label class="label cursor-pointer gap-2">
                            <input
                                type="checkbox"
                                class="toggle toggle-primary"
                                prop:checked=auto_on
                                on:change=on_toggle_refresh
                            />
                            <span class="label-text">"Auto-refresh"</span>
                        </label>
                        <select
                            class="select select-bordered select-sm"
                            on:change=on_interval
                            prop:value=move || state.with(|s| s.refresh_interval.to_string())
                        >
                            {REFRESH_INTERVAL_CHOICES
                                .iter()
                                .map(|secs| view! { <option value=secs.to_string()>{format!("{}s", secs)}</option> })
                                .collect_view()}
                        </select>
                        <Show when=auto_on>
                            <span class="badge badge-primary">
                                "Next refresh in " {move || state.with(|s| s.countdown)} "s"
                            </span>
                        </Show>
                        <label class="label cursor-pointer gap-2">
                            <input
                                type="checkbox"
                                class="checkbox checkbox-primary"
                                prop:checked=move || state.with(|s| s.auto_predict)
                                on:change=on_auto_predict
                            />
                            <span class="label-text">"Predict on every reading"</span>
                        </label>
                    </div>

                    <SensorCards
                        sensor=slice(state, |s| s.sensor.clone())
                        bmi=slice(state, |s| s.user.as_ref().and_then(|u| u.bmi()))
                    />

                    <div class="grid grid-cols-1 lg:grid-cols-3 gap-8">
                        <PredictionPanel
                            pregnancies=slice(state, |s| s.pregnancies)
                            on_pregnancies=on_pregnancies
                            predicting=slice(state, |s| s.predicting)
                            can_predict=slice(state, |s| s.sensor.is_some() && s.user.is_some())
                            prediction=slice(state, |s| s.prediction.clone())
                            error=slice(state, |s| s.error.clone())
                            on_predict=on_predict
                        />
                        <div class="lg:col-span-2">
                            <HistoryTable history=slice(state, |s| s.history.clone()) />
                        </div>
                    </div>
                </Show>
            </div>
        </div>
    }
}
