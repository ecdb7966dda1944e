//! Plain-text rendering of the core view models.

use cinedeck_api::models::{format_runtime, image_url, MediaDetails, MediaItem, MediaPage};
use cinedeck_core::error::CoreError;
use cinedeck_core::pagination::PageState;
use cinedeck_core::playback::PlaybackController;

const POSTER_SIZE: &str = "w500";

fn line(item: &MediaItem) -> String {
    let year = item
        .release_year()
        .map(|y| format!(" ({y})"))
        .unwrap_or_default();
    let genres = item.card_genres().join(", ");
    format!(
        "{:>8}  {:<5} {}{year}  ★ {:.1}  {genres}",
        item.id,
        item.kind.as_str(),
        item.display_title,
        item.vote_average
    )
}

pub fn rail(title: &str, page: &MediaPage) {
    println!("== {title} ==");
    for item in page.items.iter().take(10) {
        println!("{}", line(item));
    }
    println!();
}

pub fn list(state: &PageState) {
    for item in &state.items {
        println!("{}", line(item));
    }
    let total = state
        .total_pages
        .map(|t| t.to_string())
        .unwrap_or_else(|| "?".into());
    println!(
        "-- {} items, page {}/{total}{}",
        state.items.len(),
        state.current_page,
        if state.is_exhausted() { ", end of list" } else { "" }
    );
}

pub fn session(playback: &PlaybackController, image_base: &str) -> Result<(), CoreError> {
    let Some(details) = playback.details() else {
        return Ok(());
    };
    let item = details.item();

    println!("{}", line(item));
    println!();
    println!("{}", item.overview_or_placeholder());
    println!();
    if let Some(runtime) = details.runtime() {
        println!("Runtime:   {}", format_runtime(runtime));
    }
    if let Some(poster) = image_url(image_base, POSTER_SIZE, item.poster_path.as_deref()) {
        println!("Poster:    {poster}");
    }

    let extras = details.extras();
    if !extras.genres.is_empty() {
        let names: Vec<&str> = extras.genres.iter().map(|g| g.name.as_str()).collect();
        println!("Genres:    {}", names.join(", "));
    }
    if let Some(director) = extras.director() {
        println!("Director:  {}", director.name);
    }
    if !extras.main_cast().is_empty() {
        let cast: Vec<String> = extras
            .main_cast()
            .iter()
            .map(|c| format!("{} as {}", c.name, c.character))
            .collect();
        println!("Cast:      {}", cast.join(", "));
    }
    if let Some(url) = extras.trailer().and_then(|t| t.watch_url()) {
        println!("Trailer:   {url}");
    }

    if let MediaDetails::Show(show) = &**details {
        if let Some(selection) = playback.selection() {
            println!();
            println!(
                "Season {} of {}",
                selection.season,
                show.number_of_seasons.unwrap_or(show.seasons.len() as u32)
            );
            if let Some(e) = playback.season_error() {
                println!("  (episodes unavailable: {e})");
            }
            for episode in &selection.episode_list {
                let marker = if selection.episode.as_ref() == Some(episode) {
                    '>'
                } else {
                    ' '
                };
                println!("{marker} {:>3}. {}", episode.episode_number, episode.name);
            }
        }
    }

    if let Some(selection) = playback.selection() {
        let provider = playback
            .providers()
            .get(&selection.provider)
            .map(|p| p.name.as_str())
            .unwrap_or(selection.provider.as_str());
        println!();
        println!("Provider:  {provider}");
    }
    if let Some(url) = playback.embed_url()? {
        println!("Play:      {url}");
    }

    let recommended = playback.recommendations();
    if !recommended.is_empty() {
        println!();
        println!("== Recommended ==");
        for item in recommended.iter().take(6) {
            println!("{}", line(item));
        }
    }
    Ok(())
}
