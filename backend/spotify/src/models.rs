//! Serde mirrors of the Spotify Web API response shapes the bot reads.

use serde::Deserialize;

use jukebot_core::Track;

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub tracks: TrackPage,
}

#[derive(Debug, Deserialize)]
pub struct TrackPage {
    pub items: Vec<TrackObject>,
}

#[derive(Debug, Deserialize)]
pub struct TrackObject {
    pub name: String,
    pub uri: String,
    pub album: AlbumObject,
    pub artists: Vec<ArtistObject>,
}

#[derive(Debug, Deserialize)]
pub struct AlbumObject {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ArtistObject {
    pub name: String,
}

impl From<TrackObject> for Track {
    fn from(track: TrackObject) -> Self {
        Track {
            name: track.name,
            uri: track.uri,
            album: track.album.name,
            artists: track.artists.into_iter().map(|artist| artist.name).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QueueResponse {
    pub queue: Vec<TrackObject>,
}

#[derive(Debug, Deserialize)]
pub struct CurrentlyPlaying {
    pub is_playing: bool,
    pub currently_playing_type: String,
    pub item: Option<TrackObject>,
}

#[derive(Debug, Deserialize)]
pub struct DevicesResponse {
    pub devices: Vec<Device>,
}

#[derive(Debug, Deserialize)]
pub struct Device {
    /// Restricted devices report no id.
    pub id: Option<String>,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_response_maps_to_track() {
        let json = r#"{
            "tracks": {
                "items": [{
                    "name": "Resonance",
                    "uri": "spotify:track:abc",
                    "album": { "name": "Odyssey", "release_date": "2014-06-24" },
                    "artists": [{ "name": "Home" }, { "name": "Other" }]
                }]
            }
        }"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let track = Track::from(response.tracks.items.into_iter().next().unwrap());
        assert_eq!(track.name, "Resonance");
        assert_eq!(track.uri, "spotify:track:abc");
        assert_eq!(track.album, "Odyssey");
        assert_eq!(track.artists, ["Home", "Other"]);
    }

    #[test]
    fn currently_playing_tolerates_missing_item() {
        let json = r#"{ "is_playing": false, "currently_playing_type": "ad", "item": null }"#;
        let playing: CurrentlyPlaying = serde_json::from_str(json).unwrap();
        assert!(!playing.is_playing);
        assert!(playing.item.is_none());
    }
}
