use chrono::Utc;
use timekeep_core::view::{render, ViewContext};
use timekeep_core::{Config, Route, Runtime};

pub fn run(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let route = Route::resolve(path);
    let config = Config::load_or_default();
    let mut runtime = Runtime::open(&config)?;
    runtime.load(Utc::now());

    let store = runtime.store();
    let preferences = store.preferences();
    let stats = store.stats();
    let history = store.history();
    let ctx = ViewContext {
        engine: runtime.engine(),
        preferences: &preferences,
        stats: &stats,
        history: &history,
    };
    print!("{}", render(route, &ctx));
    Ok(())
}
