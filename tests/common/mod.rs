use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use secret_santa::application::service::{NewParticipant, SantaService};
use secret_santa::domain::game::Game;
use secret_santa::domain::participant::Participant;
use secret_santa::infrastructure::ids::UuidGenerator;
use secret_santa::infrastructure::in_memory::InMemoryGameStore;
use secret_santa::infrastructure::notifier::InMemoryNotifier;
use std::io::Write;
use tempfile::NamedTempFile;

/// Participants `p0..p{n-1}`; id, name and token share the same suffix.
pub fn participants(n: usize) -> Vec<Participant> {
    (0..n)
        .map(|i| {
            Participant::new(format!("p{i}").into(), &format!("P{i}"), None, format!("tok-{i}"))
                .unwrap()
        })
        .collect()
}

/// A game over `n` participants with a freshly generated assignment.
pub fn game(n: usize, seed: u64) -> Game {
    let participants = participants(n);
    let assignments = secret_santa::domain::engine::generate(
        &participants,
        &mut StdRng::seed_from_u64(seed),
    )
    .unwrap();
    Game {
        id: "game".into(),
        name: "Test exchange".to_string(),
        organizer_token: "organizer".to_string(),
        allow_reassignment: true,
        participants,
        assignments,
        reassignment_requests: Vec::new(),
        created_at: Utc::now(),
        version: 0,
    }
}

pub fn roster(names: &[&str]) -> Vec<NewParticipant> {
    names.iter().map(|n| NewParticipant::new(*n, None)).collect()
}

pub fn service(seed: u64) -> (SantaService, InMemoryNotifier) {
    let notifier = InMemoryNotifier::new();
    let service = SantaService::new(
        Box::new(InMemoryGameStore::new()),
        Box::new(notifier.clone()),
        Box::new(UuidGenerator),
    )
    .with_rng(StdRng::seed_from_u64(seed));
    (service, notifier)
}

pub fn participants_csv(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "name,email").unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file
}
