// security-focused integration tests

mod support;

use axum::http::StatusCode;
use support::{body_bytes, get, Fixture};
use tower::ServiceExt;

const ATTACK_VECTORS: &[&str] = &[
    "../secret.txt",
    "../../secret.txt",
    "../../../etc/passwd",
    "/etc/passwd",
    "%2e%2e/%2e%2e/secret.txt",
    "..%2f..%2fsecret.txt",
    "a.jpg/../../../secret.txt",
    "./../../secret.txt",
    ".//..//..//secret.txt",
    "sub/../../../secret.txt",
    "..%00/secret.txt",
];

fn fixture_with_secret() -> Fixture {
    let fixture = Fixture::new();
    fixture.add_file("vacation/a.jpg", "safe content");
    // one level above the image root, next to the thumbnail root
    std::fs::write(fixture.temp_dir.path().join("secret.txt"), "secret content").unwrap();
    fixture
}

async fn assert_rejected(fixture: &Fixture, uri: &str) {
    let response = fixture.app().oneshot(get(uri)).await.unwrap();
    let status = response.status();
    let body = body_bytes(response).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
    assert!(
        !String::from_utf8_lossy(&body).contains("secret content"),
        "leaked secret via {uri}"
    );
}

#[tokio::test]
async fn test_path_traversal_through_image_argument() {
    let fixture = fixture_with_secret();

    for attack in ATTACK_VECTORS {
        assert_rejected(&fixture, &format!("/api/v1/image?album=vacation&image={attack}")).await;
        assert_rejected(
            &fixture,
            &format!("/api/v1/image?album=vacation&image={attack}&thumb=10x10"),
        )
        .await;
    }
}

#[tokio::test]
async fn test_path_traversal_through_video_argument() {
    let fixture = fixture_with_secret();

    for attack in ATTACK_VECTORS {
        assert_rejected(&fixture, &format!("/api/v1/video?album=vacation&image={attack}")).await;
    }
}

#[tokio::test]
async fn test_path_traversal_through_album_argument() {
    let fixture = fixture_with_secret();

    for album in ["..", "../..", "%2e%2e", "..%2f..", "vacation/..", "%00"] {
        for uri in [
            format!("/api/v1/list?album={album}"),
            format!("/api/v1/thumbnails?album={album}&thumb=10x10"),
            format!("/api/v1/image?album={album}&image=secret.txt"),
            format!("/api/v1/video?album={album}&image=secret.txt"),
        ] {
            assert_rejected(&fixture, &uri).await;
        }
    }

    assert_eq!(fixture.codec.calls(), 0);
}

#[tokio::test]
async fn test_traversal_in_thumbnail_request() {
    let fixture = fixture_with_secret();

    for attack in ATTACK_VECTORS {
        assert_rejected(
            &fixture,
            &format!("/api/v1/thumbnails?album=vacation&thumb=10x10&image={attack}"),
        )
        .await;
    }
}

#[tokio::test]
async fn test_size_token_cannot_shape_artifact_path() {
    let fixture = fixture_with_secret();

    for thumb in ["..", "../10x10", "10x10/..", "10%2f10"] {
        assert_rejected(
            &fixture,
            &format!("/api/v1/thumbnails?album=vacation&thumb={thumb}&image=a.jpg"),
        )
        .await;
    }

    assert_eq!(fixture.codec.calls(), 0);
    assert!(fixture.codec.artifacts().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinks_inside_root_are_followed() {
    let fixture = fixture_with_secret();

    // confinement is lexical, the link target is not resolved
    std::os::unix::fs::symlink(
        fixture.image_dir().join("vacation/a.jpg"),
        fixture.image_dir().join("vacation/link.jpg"),
    )
    .unwrap();

    let response = fixture
        .app()
        .oneshot(get("/api/v1/image?album=vacation&image=link.jpg"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"safe content");
}

#[tokio::test]
async fn test_error_envelope_does_not_leak_paths() {
    let fixture = fixture_with_secret();

    let response = fixture
        .app()
        .oneshot(get("/api/v1/image?album=vacation&image=../../secret.txt"))
        .await
        .unwrap();
    let body = String::from_utf8(body_bytes(response).await).unwrap();

    assert!(!body.contains(&fixture.temp_dir.path().display().to_string()));
    assert!(body.contains("malformed argument"));
}
