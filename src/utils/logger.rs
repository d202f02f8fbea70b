use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

const DEFAULT_FILTER: &str = "warn,shortnova=info";

pub fn init_logger() {
    // RUST_LOG переопределяет фильтр по умолчанию
    let env = Env::default().filter_or("RUST_LOG", DEFAULT_FILTER);

    let mut builder = Builder::from_env(env);

    // Явно подавляем логи от HTTP-стека
    builder
        .filter_module("mio", LevelFilter::Error)
        .filter_module("hyper", LevelFilter::Error)
        .filter_module("hyper_util", LevelFilter::Error)
        .filter_module("reqwest", LevelFilter::Warn)
        .filter_module("rustls", LevelFilter::Warn)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr);

    // Повторная инициализация (например, из тестов) не считается ошибкой
    let _ = builder.try_init();
}
