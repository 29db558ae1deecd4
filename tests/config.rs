use chrono::NaiveDate;
use reviewbot::config::{default_output_path, listing_url, parse_window, profile_dir};
use std::path::PathBuf;

#[test]
fn listing_url_filters_recent_negative_reviews() {
    let url = listing_url(1180320, "schinese").unwrap();
    assert_eq!(
        url.as_str(),
        "https://steamcommunity.com/app/1180320/negativereviews/?browsefilter=mostrecent&snr=1_5_100010_&filterLanguage=schinese"
    );
}

#[test]
fn output_name_embeds_app_and_date() {
    let date = NaiveDate::from_ymd_opt(2025, 1, 9).unwrap();
    assert_eq!(
        default_output_path(570, date),
        PathBuf::from("steam_reviews_570_20250109.csv")
    );
}

#[test]
fn window_size_parses() {
    assert_eq!(parse_window("1920x1080"), Ok((1920, 1080)));
    assert_eq!(parse_window("800X600"), Ok((800, 600)));
    assert!(parse_window("1920").is_err());
    assert!(parse_window("widex1080").is_err());
}

#[test]
fn profile_dir_override_wins() {
    let custom = PathBuf::from("/tmp/reviewbot-profile");
    assert_eq!(profile_dir("default", Some(custom.clone())), custom);
    assert!(profile_dir("work", None).ends_with(".reviewbot/profiles/work"));
}
