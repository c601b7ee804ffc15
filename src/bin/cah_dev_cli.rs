use cah_engine::api::{ChooseWinnerCommand, ChooseWinnerPayload, Command};
use cah_engine::broadcast::spawn_listener;
use cah_engine::domain::{MatchId, MatchState, Phase, PlayerProfile};
use cah_engine::engine::{MatchOptions, RandomSource};
use cah_engine::infra::{CardCatalog, SystemRng};
use cah_engine::{AppState, EngineConfig};

const EXPANSION: &str = "dev";
const PLAYERS: u64 = 4;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = match std::env::var("CAH_ENGINE_CONFIG") {
        Ok(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| EngineConfig::from_json_str(&json).map_err(|e| e.to_string()))
        {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Не удалось прочитать конфиг {path}: {e}");
                return;
            }
        },
        Err(_) => EngineConfig::default(),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Не удалось поднять runtime: {e}");
            return;
        }
    };

    runtime.block_on(run(config));
}

async fn run(config: EngineConfig) {
    println!("=== CAH DEV CLI ===\n");

    let app = AppState::in_memory(config);
    let mut rng = SystemRng;

    // Дополнение с простыми картами.
    let whites: String = (1..=120).map(|i| format!("White card #{i}\n")).collect();
    let blacks: String = (1..=15)
        .map(|i| {
            if i % 3 == 0 {
                format!("Prompt #{i}: _ and _\n")
            } else {
                format!("Prompt #{i}: _\n")
            }
        })
        .collect();
    app.catalog.load_expansion(EXPANSION, &whites, &blacks);

    // Комната и игроки.
    let owner = PlayerProfile::new(1, "Player 1");
    let room = match app.lobby.create_room(owner, "Dev room", "") {
        Ok(room) => room,
        Err(e) => {
            eprintln!("Ошибка создания комнаты: {e}");
            return;
        }
    };
    for id in 2..=PLAYERS {
        if let Err(e) = app.lobby.join(room.id, PlayerProfile::new(id, format!("Player {id}"))) {
            eprintln!("Ошибка входа игрока {id}: {e}");
            return;
        }
    }

    let options = MatchOptions::new()
        .white_deck(app.catalog.whites_by_expansion(&[EXPANSION]))
        .black_deck(app.catalog.blacks_by_expansion(&[EXPANSION]))
        .hand_size(7)
        .random_starting_czar()
        .max_rounds(8);

    let started = app
        .lobby
        .create_state()
        .and_then(|state| app.lobby.start(room.id, state, options, &mut rng));
    let snapshot = match started {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Матч не стартовал: {e}");
            return;
        }
    };
    let match_id = snapshot.id;
    println!("Матч {match_id} начат, царь: {:?}\n", snapshot.current_czar().map(|p| p.id()));

    // Зритель: печатает каждую новую версию.
    let listener = match app.manager.watch(match_id) {
        Ok((_, subscription)) => Some(spawn_listener(subscription, |s| async move {
            println!(
                "  [watch] v{} phase={} round={}/{} whites_left={}",
                s.version,
                s.phase,
                s.curr_round,
                s.max_rounds,
                s.white_deck.len()
            );
            Ok::<(), std::convert::Infallible>(())
        })),
        Err(e) => {
            eprintln!("Не удалось подписаться: {e}");
            None
        }
    };

    if let Err(e) = play_until_finished(&app, match_id, &mut rng).await {
        eprintln!("Матч прерван: {e}");
    }

    app.manager.unload(match_id);
    if let Some(handle) = listener {
        let _ = handle.await;
    }
}

async fn play_until_finished(
    app: &AppState,
    match_id: MatchId,
    rng: &mut SystemRng,
) -> Result<(), String> {
    loop {
        // Даём зрителю вычитать очередь между ходами.
        tokio::task::yield_now().await;

        let state = app.manager.snapshot(match_id).map_err(|e| e.to_string())?;
        match state.phase {
            Phase::Finished => break,
            Phase::SinnersPlaying => {
                let sinners: Vec<u64> = state
                    .sinners()
                    .filter(|(_, p)| !p.has_played())
                    .map(|(_, p)| p.id())
                    .collect();
                for player_id in sinners {
                    app.manager
                        .play_random_white_cards(match_id, player_id, rng)
                        .map_err(|e| e.to_string())?;
                }
            }
            Phase::CzarChoosingWinner => {
                let czar = state.current_czar().map(|p| p.id()).ok_or("нет царя")?;
                let sinners: Vec<u64> = state.sinners().map(|(_, p)| p.id()).collect();
                let winner = sinners[rng.index(sinners.len())];

                let response = app
                    .handle_command(
                        Command::ChooseWinner(ChooseWinnerCommand {
                            match_id,
                            player_id: czar,
                            payload: ChooseWinnerPayload { winner_id: winner },
                        }),
                        rng,
                    )
                    .map_err(|e| format!("{e:?}"))?;
                println!("Раунд {}: победил игрок {winner}", state.curr_round);
                if response.is_finished() {
                    break;
                }
            }
        }
    }

    let final_state = app.manager.snapshot(match_id).map_err(|e| e.to_string())?;
    print_summary(&final_state);
    Ok(())
}

fn print_summary(state: &MatchState) {
    println!();
    println!("=========== MATCH SUMMARY ===========");
    println!("Раундов сыграно: {}", state.curr_round);
    for p in &state.players {
        println!("{:<10} очков: {}", p.profile.name, p.points.len());
    }
    println!("В сбросе белых карт: {}", state.discard_pile.len());
    println!("=====================================");
}
