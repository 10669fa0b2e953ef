//! Known API paths.
//!
//! Only the login body is modelled; everything else is passed through as raw
//! JSON. More paths can be found by searching the vendor app for `app/`.

pub const LOGIN: &str = "app/account/login";
pub const DEVICE_BIND_LIST: &str = "app/device/bind/list";
pub const DEVICE_BIND_LIST_REFRESH: &str = "app/device/bind/list/refresh";
pub const DEVICE_MODEL_LIST: &str = "app/device/model/list";
pub const HISTORY_PAGE: &str = "app/history/page";
pub const MQTT_CERT_APPLY: &str = "app/mqtt/cert/apply";
pub const DICT_LIST: &str = "app/dict/list";
pub const ARTICLE_LIST: &str = "app/article/list";
pub const COLLECTION_LIST: &str = "app/collection/list";
pub const FAVORITE_PAGE: &str = "app/favorite/page";
pub const NOTIFICATION_HAS_NEW: &str = "app/notification/has/new";
pub const OTA_VERSION_CHECK: &str = "app/ota/version/check";
pub const PRESET_PAGE: &str = "app/preset/page";
pub const USER_GET: &str = "app/user/get";
pub const USER_SETTING_GET: &str = "app/user/setting/get";
