use relayx::core::events::{EventListener, LoggingListener};
use relayx::providers::tencent::{TencentSmsConfig, TencentSmsMessage};
use relayx::utils::{create_dispatcher, init_tracing, LogFormat};
use relayx::{
    Channel, DispatchOptions, EventKind, HttpPolicy, MessageType, ProviderCredentials,
    RetryPolicy, TencentSmsSender,
};
use std::env;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("relayx=info", LogFormat::Text);

    // Example usage - set TENCENT_ACCESS_KEY_ID / TENCENT_ACCESS_KEY_SECRET
    // and the variables below (a .env file works too)
    #[cfg(feature = "env-file")]
    let credentials = ProviderCredentials::from_env_file("TENCENT");
    #[cfg(not(feature = "env-file"))]
    let credentials = ProviderCredentials::from_env("TENCENT");

    let credentials = match credentials {
        Ok(credentials) => credentials,
        Err(e) => {
            println!("Skipping demo: {}", e);
            return Ok(());
        }
    };
    let (Ok(sdk_app_id), Ok(sign_name), Ok(template_id), Ok(phone)) = (
        env::var("TENCENT_SMS_SDK_APP_ID"),
        env::var("TENCENT_SMS_SIGN_NAME"),
        env::var("TENCENT_SMS_TEMPLATE_ID"),
        env::var("RELAYX_DEMO_PHONE"),
    ) else {
        println!(
            "Set TENCENT_SMS_SDK_APP_ID, TENCENT_SMS_SIGN_NAME, TENCENT_SMS_TEMPLATE_ID \
             and RELAYX_DEMO_PHONE to run the demo"
        );
        return Ok(());
    };

    let dispatcher = create_dispatcher(HttpPolicy::from_env()?)?;
    for (route, adapter) in dispatcher.registry().list()? {
        println!("Route {} -> {}", route, adapter);
    }

    let listener: Arc<dyn EventListener> = Arc::new(LoggingListener);
    for kind in EventKind::ALL {
        dispatcher.events().register(kind, listener.clone())?;
    }

    let config = TencentSmsConfig::new(credentials, sdk_app_id, "ap-guangzhou", sign_name);
    let message = TencentSmsMessage::new(template_id)
        .add_phone(&phone)?
        .add_param("1234");
    let options = DispatchOptions::default()
        .with_retry(RetryPolicy::new(3, Duration::from_millis(500)));

    match dispatcher
        .send_with_options::<TencentSmsSender>(
            MessageType::Sms,
            &Channel::TENCENT_SMS,
            &config,
            &message,
            &options,
        )
        .await
    {
        Ok(response) => {
            println!("Request {} accepted", response.request_id);
            for status in &response.send_status_set {
                println!("  {}: {} ({})", status.phone_number, status.code, status.message);
            }
        }
        Err(e) => {
            println!("Dispatch failed [{}]: {}", e.code(), e);
        }
    }

    dispatcher.events().shutdown(Duration::from_secs(2)).await;
    Ok(())
}
