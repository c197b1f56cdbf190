// Game server endpoint functions.
// One typed method per REST call the admin panel makes.

use reqwest::{Method, StatusCode};

use crate::error::Result;
use crate::session::GameId;

use super::client::{ApiOutcome, GameClient};
use super::types::{
    AdminBody, ChipTransfer, EmptyBody, Game, JoinBody, RequesterBody, ServerMessage, UserId,
};

/// Most actions answer with `{Message}` on success; keep it if present.
fn message_of(outcome: ApiOutcome<String>) -> ApiOutcome<Option<String>> {
    outcome.map(|body| ServerMessage::parse(&body))
}

impl GameClient {
    /// Fetch the full game snapshot.
    pub async fn get_game(&self, game: &GameId) -> Result<ApiOutcome<Game>> {
        let outcome = self
            .send::<EmptyBody>(Method::GET, &["game", game.as_str()], None, StatusCode::OK)
            .await?;
        outcome.try_map(|body| serde_json::from_str::<Game>(&body))
    }

    /// Remove a player from the game.
    pub async fn delete_player(
        &self,
        game: &GameId,
        user_id: UserId,
    ) -> Result<ApiOutcome<Option<String>>> {
        let user = user_id.to_string();
        let outcome = self
            .send::<EmptyBody>(
                Method::DELETE,
                &["game", game.as_str(), "user", user.as_str()],
                None,
                StatusCode::OK,
            )
            .await?;
        Ok(message_of(outcome))
    }

    /// Sort the dice of all players.
    pub async fn sort_dice(
        &self,
        game: &GameId,
        admin_id: UserId,
    ) -> Result<ApiOutcome<Option<String>>> {
        let outcome = self
            .send(
                Method::PUT,
                &["game", game.as_str(), "sort"],
                Some(&AdminBody { admin_id }),
                StatusCode::OK,
            )
            .await?;
        Ok(message_of(outcome))
    }

    /// Promote or demote `target` as admin on behalf of `requester_id`.
    pub async fn toggle_admin(
        &self,
        game: &GameId,
        target: UserId,
        requester_id: UserId,
    ) -> Result<ApiOutcome<Option<String>>> {
        let target = target.to_string();
        let outcome = self
            .send(
                Method::POST,
                &["game", game.as_str(), "user", target.as_str(), "toggle_admin"],
                Some(&RequesterBody { requester_id }),
                StatusCode::OK,
            )
            .await?;
        Ok(message_of(outcome))
    }

    /// Put the game back into the waiting room. The server answers 201.
    pub async fn back_to_waiting(&self, game: &GameId) -> Result<ApiOutcome<Option<String>>> {
        let outcome = self
            .send(
                Method::POST,
                &["game", game.as_str(), "back"],
                Some(&EmptyBody::default()),
                StatusCode::CREATED,
            )
            .await?;
        Ok(message_of(outcome))
    }

    /// Move chips between the stack, the schockaus pool and players.
    pub async fn transfer_chips(
        &self,
        game: &GameId,
        transfer: &ChipTransfer,
        admin_id: UserId,
    ) -> Result<ApiOutcome<Option<String>>> {
        let outcome = self
            .send(
                Method::POST,
                &["game", game.as_str(), "user", "chips"],
                Some(&transfer.body(admin_id)),
                StatusCode::OK,
            )
            .await?;
        Ok(message_of(outcome))
    }

    /// Let the server score the round and hand out the chips.
    pub async fn distribute(&self, game: &GameId) -> Result<ApiOutcome<Option<String>>> {
        let outcome = self
            .send(
                Method::POST,
                &["game", game.as_str(), "distribute"],
                Some(&EmptyBody::default()),
                StatusCode::OK,
            )
            .await?;
        Ok(message_of(outcome))
    }

    /// Vote for revealing all dice.
    pub async fn vote_reveal(
        &self,
        game: &GameId,
        requester_id: UserId,
    ) -> Result<ApiOutcome<Option<String>>> {
        let outcome = self
            .send(
                Method::POST,
                &["game", game.as_str(), "vote_reveal"],
                Some(&RequesterBody { requester_id }),
                StatusCode::OK,
            )
            .await?;
        Ok(message_of(outcome))
    }

    /// Toggle whether `user_id` leaves after the current game.
    pub async fn mark_leave(
        &self,
        game: &GameId,
        user_id: UserId,
        requester_id: UserId,
    ) -> Result<ApiOutcome<Option<String>>> {
        let user = user_id.to_string();
        let outcome = self
            .send(
                Method::POST,
                &["game", game.as_str(), "user", user.as_str(), "mark_leave"],
                Some(&RequesterBody { requester_id }),
                StatusCode::OK,
            )
            .await?;
        Ok(message_of(outcome))
    }

    /// Toggle the return to the lobby after the current game.
    pub async fn mark_lobby(
        &self,
        game: &GameId,
        requester_id: UserId,
    ) -> Result<ApiOutcome<Option<String>>> {
        let outcome = self
            .send(
                Method::POST,
                &["game", game.as_str(), "mark_lobby"],
                Some(&RequesterBody { requester_id }),
                StatusCode::OK,
            )
            .await?;
        Ok(message_of(outcome))
    }

    /// Join the game, or rejoin when `reconnect_id` is set. Returns the updated game.
    pub async fn join(&self, game: &GameId, body: &JoinBody) -> Result<ApiOutcome<Game>> {
        let outcome = self
            .send(
                Method::POST,
                &["game", game.as_str(), "user"],
                Some(body),
                StatusCode::OK,
            )
            .await?;
        outcome.try_map(|body| serde_json::from_str::<Game>(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TransferSource;
    use crate::test_support::MockServer;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_game_parses_snapshot() {
        let server = MockServer::start().await;
        server.respond(
            "GET",
            "/api/game/g1",
            200,
            json!({"Stack_Max": 13, "User": [{"Id": 1, "Name": "Anna"}]}).to_string(),
        );

        let client = GameClient::new(server.base_url()).unwrap();
        let game = GameId::new("g1").unwrap();
        match client.get_game(&game).await.unwrap() {
            ApiOutcome::Success(game) => {
                assert_eq!(game.stack_max, 13);
                assert_eq!(game.users[0].name, "Anna");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_back_to_waiting_expects_created() {
        let server = MockServer::start().await;
        server.respond(
            "POST",
            "/api/game/g1/back",
            200,
            json!({"Message": "success"}).to_string(),
        );

        let client = GameClient::new(server.base_url()).unwrap();
        let game = GameId::new("g1").unwrap();
        let outcome = client.back_to_waiting(&game).await.unwrap();
        assert_eq!(
            outcome,
            ApiOutcome::Rejected {
                status: StatusCode::OK,
                message: Some("success".to_string()),
            }
        );

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body, Some(json!({})));
    }

    #[tokio::test]
    async fn test_transfer_sends_variant_body() {
        let server = MockServer::start().await;
        server.respond(
            "POST",
            "/api/game/g1/user/chips",
            200,
            json!({"Message": "2 Chip(s) vom Stapel an: Ben verteilt!"}).to_string(),
        );

        let client = GameClient::new(server.base_url()).unwrap();
        let game = GameId::new("g1").unwrap();
        let transfer = ChipTransfer {
            source: TransferSource::Stack,
            target: 2,
            count: 2,
        };
        let outcome = client.transfer_chips(&game, &transfer, 1).await.unwrap();
        assert!(outcome.is_success());

        let requests = server.requests();
        assert_eq!(
            requests[0].body,
            Some(json!({"count": 2, "stack": true, "target": 2, "admin_id": 1}))
        );
    }

    #[tokio::test]
    async fn test_delete_player_sends_no_body() {
        let server = MockServer::start().await;
        server.respond("DELETE", "/api/game/g1/user/5", 200, json!({"Message": "success"}).to_string());

        let client = GameClient::new(server.base_url()).unwrap();
        let game = GameId::new("g1").unwrap();
        let outcome = client.delete_player(&game, 5).await.unwrap();
        assert_eq!(outcome, ApiOutcome::Success(Some("success".to_string())));
        assert_eq!(server.requests()[0].body, None);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        // Reserve a port, then close it so nothing listens there.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = GameClient::new(&format!("http://127.0.0.1:{}", port)).unwrap();
        let game = GameId::new("g1").unwrap();
        assert!(client.distribute(&game).await.is_err());
    }
}
