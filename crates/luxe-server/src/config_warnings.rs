use luxe_config::LuxeConfig;

const SECTIONS: &[&str] = &["DATABASE", "STORAGE", "TOOLS", "TELEGRAM", "SERVER"];

pub fn warn_unconfigured(config: &LuxeConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &LuxeConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();

    let mut warnings = Vec::new();

    for section in SECTIONS {
        let single = format!("LUXE_{section}_");
        let double = format!("LUXE_{section}__");
        if let Some(key) = env_keys
            .iter()
            .find(|key| key.starts_with(&single) && !key.starts_with(&double))
        {
            warnings.push(format!(
                "{key} is ignored. Use double underscores between section and field \
                 (example: LUXE_{section}__{})",
                &key[single.len()..]
            ));
        }
    }

    let telegram = &config.telegram;
    let half_set = !telegram.bot_token.is_empty() || !telegram.chat_id.is_empty();
    if !telegram.is_configured() && half_set {
        warnings.push(
            "Telegram shipping is disabled: both telegram.bot_token and telegram.chat_id \
             must be set."
                .to_string(),
        );
    }

    warnings
}
