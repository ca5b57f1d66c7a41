use scenario_explorer::executor::executor::{ActionExecutor, ExecutorConfig};

pub const HOME_SCREEN: &str = r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>
<hierarchy rotation="0">
  <node index="0" text="" resource-id="" class="android.widget.FrameLayout" package="com.android.launcher3" content-desc="" bounds="[0,0][1080,1920]">
    <node index="0" text="Settings" resource-id="com.android.launcher3:id/icon" class="android.widget.TextView" package="com.android.launcher3" content-desc="Settings" visible-to-user="true" bounds="[60,1500][260,1700]" />
    <node index="1" text="Chrome" resource-id="com.android.launcher3:id/icon" class="android.widget.TextView" package="com.android.launcher3" content-desc="Chrome" visible-to-user="true" bounds="[300,1500][500,1700]" />
    <node index="2" text="Hidden" resource-id="com.android.launcher3:id/hidden" class="android.widget.TextView" package="com.android.launcher3" content-desc="" visible-to-user="false" bounds="[0,0][0,0]" />
  </node>
</hierarchy>"#;

pub const SEARCH_SCREEN: &str = r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>
<hierarchy rotation="0">
  <node index="0" text="" resource-id="" class="android.widget.FrameLayout" package="com.android.settings" content-desc="" bounds="[0,0][1080,1920]">
    <node index="0" text="" resource-id="com.android.settings:id/search_src_text" class="android.widget.EditText" package="com.android.settings" content-desc="Search settings" visible-to-user="true" bounds="[40,80][1040,200]" />
    <node index="1" text="Network &amp; internet" resource-id="android:id/title" class="android.widget.TextView" package="com.android.settings" content-desc="" visible-to-user="true" bounds="[40,300][1040,400]" />
    <node index="2" text="Connected devices" resource-id="android:id/title" class="android.widget.TextView" package="com.android.settings" content-desc="" visible-to-user="true" bounds="[40,420][1040,520]" />
  </node>
</hierarchy>"#;

pub const SETTINGS_ICON: &str = "//*[@content-desc='Settings']";
pub const SEARCH_FIELD: &str = "//*[@resource-id='com.android.settings:id/search_src_text']";
pub const TITLE_ROWS: &str = "//*[@resource-id='android:id/title']";

/// Extraction reply in the fenced form the format instructions ask for.
pub fn element_reply(screen: &str, name: &str, xpath: &str) -> String {
    format!(
        "```json\n{}\n```",
        serde_json::json!({
            "screen": screen,
            "screen_description": format!("{} screen", screen),
            "name": name,
            "xpath": xpath,
        })
    )
}

/// Executor that types immediately instead of waiting for the keyboard.
pub fn instant_executor() -> ActionExecutor {
    ActionExecutor::new(ExecutorConfig {
        settle_delay_ms: 0,
        ..ExecutorConfig::default()
    })
}
