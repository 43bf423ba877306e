/// Package / bundle ids of apps that are primarily used for video calls.
pub const VIDEO_CALLING_APPS: &[&str] = &[
    "com.google.android.apps.meetings",
    "us.zoom.videomeetings",
    "com.microsoft.teams",
    "com.skype.raider",
    "com.whatsapp",
    "com.facebook.orca",
    "com.viber.voip",
    "com.discord",
    "com.tencent.mm",
    "com.snapchat.android",
    "com.instagram.android",
    "com.google.android.apps.tachyon",
    "com.apple.facetime",
    "com.linkedin.android",
    "com.webex.meetings",
    "com.gotomeeting",
    "com.bluejeansnetworks.android",
    "com.amazon.chime",
    "com.jitsi.meet",
    "com.ringcentral.meetings",
];

/// Check if an app is a known video-calling app
pub fn is_video_calling_app(package: &str) -> bool {
    VIDEO_CALLING_APPS.contains(&package)
}

/// Filter app ids to only include video-calling apps
pub fn filter_video_calling_apps<I, S>(apps: I) -> Vec<S>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    apps.into_iter()
        .filter(|app| is_video_calling_app(app.as_ref()))
        .collect()
}
