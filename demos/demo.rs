// (C) Copyright IBM Corp. 2025.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{env, error::Error, time::Duration};

use dotenvy::dotenv;
use featureflags_client::{ClientConfig, FileStorage, FlagClient, Metadata};
use serde_json::json;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();

    let api_key = env::var("FEATUREFLAGS_API_KEY").expect("FEATUREFLAGS_API_KEY should be set.");
    let flag_name = env::var("FEATUREFLAGS_FLAG").expect("FEATUREFLAGS_FLAG should be set.");
    let user_id = env::var("FEATUREFLAGS_USER_ID").ok();

    let mut builder = ClientConfig::builder(api_key).tag("environment", "demo");
    if let Ok(base_url) = env::var("FEATUREFLAGS_BASE_URL") {
        builder = builder.base_url(base_url);
    }
    let config = builder.cache_ttl(Duration::from_secs(30)).build()?;

    let storage = FileStorage::new(env::temp_dir().join("featureflags-demo"));
    let client = FlagClient::new(config, Box::new(storage))?;
    client.init().await;
    println!(
        "Anonymous user id: {}",
        client.auto_user_id().unwrap_or_default()
    );

    let user_id = user_id.as_deref();
    println!("The information is displayed every 10 seconds.");
    println!("Try changing the flag in the dashboard.");

    for _ in 0..6 {
        let enabled = client.enabled(&flag_name, user_id, false).await;
        let variant = client.variant(&flag_name, user_id, "control").await;
        println!("Flag '{flag_name}' enabled: {enabled}, variant: {variant}");
        tokio::time::sleep(Duration::from_secs(10)).await;
    }

    let mut metadata = Metadata::new();
    metadata.insert("source".to_string(), json!("demo"));
    client
        .track("demo_finished", user_id, Some(&flag_name), Some(metadata))
        .await;

    client.close();
    Ok(())
}
