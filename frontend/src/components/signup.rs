use crate::auth::use_auth;
use crate::web::route::AppRoute;
use crate::web::router::{Link, use_router};
use glycowatch::SignupForm;
use leptos::prelude::*;
use leptos::task::spawn_local;

/// One labelled input bound to a string signal.
#[component]
fn Field(
    id: &'static str,
    label: &'static str,
    #[prop(default = "text")] kind: &'static str,
    #[prop(optional)] step: Option<&'static str>,
    value: RwSignal<String>,
) -> impl IntoView {
    view! {
        <div class="form-control">
            <label class="label" for=id>
                <span class="label-text">{label}</span>
            </label>
            <input
                id=id
                type=kind
                step=step
                on:input=move |ev| value.set(event_target_value(&ev))
                prop:value=value
                class="input input-bordered"
                required
            />
        </div>
    }
}

#[component]
pub fn SignupPage() -> impl IntoView {
    let auth = use_auth();
    let router = use_router();

    let username = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let confirm_password = RwSignal::new(String::new());
    let height = RwSignal::new(String::new());
    let weight = RwSignal::new(String::new());
    let age = RwSignal::new(String::new());
    let pregnancies = RwSignal::new("0".to_string());

    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        set_error_msg.set(None);

        let form = SignupForm {
            username: username.get_untracked(),
            password: password.get_untracked(),
            confirm_password: confirm_password.get_untracked(),
            height: height.get_untracked(),
            weight: weight.get_untracked(),
            age: age.get_untracked(),
            pregnancies: pregnancies.get_untracked(),
        };
        let request = match form.validate() {
            Ok(request) => request,
            Err(e) => {
                set_error_msg.set(Some(e.message().to_string()));
                return;
            }
        };

        set_is_submitting.set(true);
        spawn_local(async move {
            match auth.signup(&request).await {
                Ok(()) => router.navigate(AppRoute::Dashboard),
                Err(e) => set_error_msg.set(Some(e.message().to_string())),
            }
            set_is_submitting.set(false);
        });
    };

    view! {
        <div class="hero min-h-screen bg-base-200">
            <div class="hero-content flex-col w-full max-w-lg">
                <div class="text-center mb-4">
                    <h1 class="text-3xl font-bold">"Create account"</h1>
                    <p class="text-base-content/70">
                        "Your profile feeds the BMI and age used by every prediction"
                    </p>
                </div>

                <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                    <form class="card-body" on:submit=on_submit>
                        {move || error_msg.get().map(|msg| view! {
                            <div role="alert" class="alert alert-error text-sm py-2">
                                <span>{msg}</span>
                            </div>
                        })}

                        <Field id="username" label="Username" value=username />
                        <div class="grid grid-cols-1 md:grid-cols-2 gap-4">
                            <Field id="password" label="Password" kind="password" value=password />
                            <Field id="confirm" label="Confirm password" kind="password" value=confirm_password />
                            <Field id="height" label="Height (m)" kind="number" step="0.01" value=height />
                            <Field id="weight" label="Weight (kg)" kind="number" step="0.1" value=weight />
                            <Field id="age" label="Age" kind="number" value=age />
                            <Field id="pregnancies" label="Pregnancies" kind="number" value=pregnancies />
                        </div>

                        <div class="form-control mt-6">
                            <button class="btn btn-primary" disabled=move || is_submitting.get()>
                                {move || if is_submitting.get() {
                                    view! { <span class="loading loading-spinner"></span> "Creating account..." }.into_any()
                                } else {
                                    "Sign up".into_any()
                                }}
                            </button>
                        </div>
                        <p class="text-center text-sm mt-2">
                            "Already registered? "
                            <Link to=AppRoute::Login class="link link-primary">"Sign in"</Link>
                        </p>
                    </form>
                </div>
            </div>
        </div>
    }
}
