#[macro_use]
extern crate rocket;

use chrono::Utc;
use rocket::response::content;
use rocket::serde::json::Json;
use rocket::State;
use rocket_cors::{AllowedOrigins, CorsOptions};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};

use territory_map::{
    flag::{AllianceId, FlagId},
    map::Map,
    map_config::MapConfig,
    outline::{trace_outlines, BoundaryLoop},
    state::MapState,
    tile::TileState,
};

const DEFAULT_FLAGS_PER_ALLIANCE: usize = 5;

#[derive(Serialize, Debug)]
struct MapResponse {
    map_state: Option<MapState>,
    outlines: Option<Vec<BoundaryLoop>>,
    flag_id: Option<FlagId>,
    tile: Option<TileState>,
    error: Option<String>,
}

impl MapResponse {
    fn success(map_state: MapState) -> Self {
        MapResponse {
            map_state: Some(map_state),
            outlines: None,
            flag_id: None,
            tile: None,
            error: None,
        }
    }

    fn error(map_state: MapState, error: String) -> Self {
        MapResponse {
            map_state: Some(map_state),
            outlines: None,
            flag_id: None,
            tile: None,
            error: Some(error),
        }
    }

    fn with_outlines(mut self, outlines: Vec<BoundaryLoop>) -> Self {
        self.outlines = Some(outlines);
        self
    }
}

#[derive(serde::Deserialize, Clone)]
struct AddFlagData {
    alliance_id: AllianceId,
    x: i32,
    y: i32,
    #[serde(default)]
    is_fortress: bool,
}

#[derive(serde::Deserialize, Clone)]
struct NewMapData {
    preset_file: Option<String>,
    num_alliances: Option<usize>,
    flags_per_alliance: Option<usize>,
}

#[derive(Clone)]
enum Request {
    AddFlag(AddFlagData),
    RemoveFlag(FlagId),
    GetTile(i32, i32),
    GetOutlines(AllianceId),
    NewMap(NewMapData),
    GetMapState,
}

struct RequestWithResponse {
    request: Request,
    response_sender: oneshot::Sender<MapResponse>,
}

struct SharedState {
    sender: mpsc::Sender<RequestWithResponse>,
}

#[derive(Serialize)]
struct ApiEndpoint {
    path: String,
    method: String,
    description: String,
}

#[get("/")]
fn api_documentation() -> content::RawJson<String> {
    let endpoints = vec![
        ApiEndpoint {
            path: "/".to_string(),
            method: "GET".to_string(),
            description: "Shows this API documentation".to_string(),
        },
        ApiEndpoint {
            path: "/map-state".to_string(),
            method: "GET".to_string(),
            description: "Get every flag and per-alliance tile counts".to_string(),
        },
        ApiEndpoint {
            path: "/flags".to_string(),
            method: "POST".to_string(),
            description: "Plant a flag for an alliance".to_string(),
        },
        ApiEndpoint {
            path: "/flags/<id>".to_string(),
            method: "DELETE".to_string(),
            description: "Remove a flag and hand its tiles to overlapping flags".to_string(),
        },
        ApiEndpoint {
            path: "/tiles/<x>/<y>".to_string(),
            method: "GET".to_string(),
            description: "Get the owner and validity of one tile".to_string(),
        },
        ApiEndpoint {
            path: "/alliances/<id>/outlines".to_string(),
            method: "GET".to_string(),
            description: "Trace the territory outlines of an alliance".to_string(),
        },
        ApiEndpoint {
            path: "/new-map".to_string(),
            method: "POST".to_string(),
            description: "Reseed the map from a preset file or random alliances".to_string(),
        },
    ];

    content::RawJson(serde_json::to_string_pretty(&endpoints).unwrap_or_default())
}

#[get("/map-state")]
async fn map_state(state: &State<SharedState>) -> Json<MapResponse> {
    send_request_and_wait(state, Request::GetMapState).await
}

#[post("/flags", data = "<data>")]
async fn add_flag(data: Json<AddFlagData>, state: &State<SharedState>) -> Json<MapResponse> {
    send_request_and_wait(state, Request::AddFlag(data.into_inner())).await
}

#[delete("/flags/<id>")]
async fn remove_flag(id: u32, state: &State<SharedState>) -> Json<MapResponse> {
    send_request_and_wait(state, Request::RemoveFlag(FlagId(id))).await
}

#[get("/tiles/<x>/<y>")]
async fn tile(x: i32, y: i32, state: &State<SharedState>) -> Json<MapResponse> {
    send_request_and_wait(state, Request::GetTile(x, y)).await
}

#[get("/alliances/<id>/outlines")]
async fn outlines(id: AllianceId, state: &State<SharedState>) -> Json<MapResponse> {
    send_request_and_wait(state, Request::GetOutlines(id)).await
}

#[post("/new-map", data = "<data>")]
async fn new_map(state: &State<SharedState>, data: Json<NewMapData>) -> Json<MapResponse> {
    send_request_and_wait(state, Request::NewMap(data.into_inner())).await
}

async fn send_request_and_wait(state: &State<SharedState>, request: Request) -> Json<MapResponse> {
    let (response_sender, response_receiver) = oneshot::channel();
    state
        .sender
        .send(RequestWithResponse {
            request,
            response_sender,
        })
        .await
        .expect("Failed to send request");

    let response = response_receiver.await.expect("Failed to receive response");
    Json(response)
}

fn seed_map(data: &NewMapData) -> Result<Map, String> {
    let config = match (&data.preset_file, data.num_alliances) {
        (Some(path), _) => MapConfig::load_from_file(Path::new(path)).map_err(|e| e.to_string())?,
        (None, Some(num_alliances)) => MapConfig::random(
            num_alliances,
            data.flags_per_alliance.unwrap_or(DEFAULT_FLAGS_PER_ALLIANCE),
        ),
        (None, None) => MapConfig::load_from_env(),
    };
    let (map, placed) = config.to_map(Utc::now());
    log::info!("new map seeded with {} flags", placed.len());
    Ok(map)
}

async fn worker_task(mut receiver: mpsc::Receiver<RequestWithResponse>, map: Arc<Mutex<Map>>) {
    while let Some(RequestWithResponse {
        request,
        response_sender,
    }) = receiver.recv().await
    {
        let mut map = map.lock().await;
        let response = match request {
            Request::AddFlag(data) => {
                match map.add_flag(data.x, data.y, data.alliance_id, data.is_fortress, Utc::now()) {
                    Ok(id) => {
                        let mut response = MapResponse::success(map.get_map_state())
                            .with_outlines(trace_outlines(&map, data.alliance_id));
                        response.flag_id = Some(id);
                        response
                    }
                    Err(e) => MapResponse::error(map.get_map_state(), e.to_string()),
                }
            }
            Request::RemoveFlag(id) => match map.remove_flag(id) {
                Some(flag) => {
                    let mut response = MapResponse::success(map.get_map_state())
                        .with_outlines(trace_outlines(&map, flag.alliance_id));
                    response.flag_id = Some(id);
                    response
                }
                None => MapResponse::error(map.get_map_state(), format!("no flag {}", id)),
            },
            Request::GetTile(x, y) => {
                let mut response = MapResponse::success(map.get_map_state());
                response.tile = map.tile(x, y).map(|tile| tile.state());
                response
            }
            Request::GetOutlines(alliance_id) => MapResponse::success(map.get_map_state())
                .with_outlines(trace_outlines(&map, alliance_id)),
            Request::NewMap(data) => match seed_map(&data) {
                Ok(seeded) => {
                    *map = seeded;
                    MapResponse::success(map.get_map_state())
                }
                Err(e) => MapResponse::error(map.get_map_state(), e),
            },
            Request::GetMapState => MapResponse::success(map.get_map_state()),
        };
        if response_sender.send(response).is_err() {
            log::warn!("client went away before its response was sent");
        }
    }
}

#[launch]
async fn rocket() -> _ {
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    let (sender, receiver) = mpsc::channel::<RequestWithResponse>(100);
    let (seeded, _) = MapConfig::load_from_env().to_map(Utc::now());
    let map = Arc::new(Mutex::new(seeded));

    tokio::spawn(worker_task(receiver, map.clone()));

    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .to_cors()
        .expect("Error creating CORS middleware");

    rocket::build()
        .manage(SharedState { sender })
        .mount(
            "/",
            routes![
                api_documentation,
                map_state,
                add_flag,
                remove_flag,
                tile,
                outlines,
                new_map
            ],
        )
        .attach(cors)
}
