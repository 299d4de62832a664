mod test_join_without_camera;
mod test_renegotiation_fallback;
mod test_screen_share_ended_by_source;
