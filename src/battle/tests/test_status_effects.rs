#[cfg(test)]
mod tests {
    use crate::battle::conditions::apply_status;
    use crate::battle::state::BattleEvent;
    use crate::battle::tests::common::*;
    use crate::errors::{BattleEngineError, IllegalStateError, ValidationError};
    use pretty_assertions::assert_eq;
    use schema::StatusKind;

    fn has_status(session: &crate::battle::engine::BattleSession, id: &str, kind: StatusKind) -> bool {
        let slot = session.find(id).unwrap();
        session.combatant(slot).unwrap().has_status(kind)
    }

    #[test]
    fn test_poison_persists_until_cured() {
        let mut session = duel();

        let turn = session
            .submit_action("hero", "poison_powder", Some("foe"), &mut rng(&[HIT, HIT]))
            .unwrap();
        assert_eq!(turn.status_applied, Some(StatusKind::Poison));

        session
            .submit_action("foe", "guard", None, &mut rng(&[HIT, HIT]))
            .unwrap();
        // 170 / 8 = 21 per round.
        assert_eq!(hp(&session, "foe"), 149);

        for _ in 0..3 {
            session
                .submit_action("hero", "guard", None, &mut rng(&[HIT, HIT]))
                .unwrap();
            session
                .submit_action("foe", "guard", None, &mut rng(&[HIT, HIT]))
                .unwrap();
        }
        assert_eq!(session.round(), 5);
        assert_eq!(hp(&session, "foe"), 170 - 4 * 21);
        assert!(has_status(&session, "foe", StatusKind::Poison));

        assert!(session.cure_status("foe", StatusKind::Poison).unwrap());
        assert!(!has_status(&session, "foe", StatusKind::Poison));
        assert_eq!(
            session.log().last().unwrap().message,
            "Foe was cured of its poison!"
        );
        assert!(!session.cure_status("foe", StatusKind::Poison).unwrap());
    }

    #[test]
    fn test_second_major_status_is_resisted() {
        let mut session = duel();
        apply_status(session.combatant_mut("foe"), StatusKind::Paralysis, None);

        let turn = session
            .submit_action("hero", "poison_powder", Some("foe"), &mut rng(&[HIT, HIT]))
            .unwrap();

        assert_eq!(turn.status_applied, None);
        assert!(turn.events.contains(&BattleEvent::StatusResisted {
            target: "Foe".to_string(),
            status: StatusKind::Poison,
        }));
        assert!(!has_status(&session, "foe", StatusKind::Poison));
    }

    #[test]
    fn test_paralysis_sometimes_blocks() {
        let mut session = duel();
        apply_status(session.combatant_mut("foe"), StatusKind::Paralysis, None);

        session
            .submit_action("hero", "strike", Some("foe"), &mut rng(&strike_rolls()))
            .unwrap();

        // Paralysis is not a hard block: the action is accepted, then rolled.
        assert_eq!(session.pending_actor_block(), None);
        let blocked = session
            .submit_action("foe", "strike", Some("hero"), &mut rng(&[25]))
            .unwrap();
        assert_eq!(blocked.blocked_by, Some(StatusKind::Paralysis));
        assert_eq!(blocked.damage, 0);
        assert!(blocked.outcomes.is_empty());
        assert_eq!(hp(&session, "hero"), 170);

        session
            .submit_action("hero", "strike", Some("foe"), &mut rng(&strike_rolls()))
            .unwrap();
        let mut rolls = vec![26];
        rolls.extend(strike_rolls());
        let acted = session
            .submit_action("foe", "strike", Some("hero"), &mut rng(&rolls))
            .unwrap();
        assert_eq!(acted.blocked_by, None);
        assert_eq!(hp(&session, "hero"), 170 - STRIKE_DAMAGE);
        assert_eq!(hp(&session, "foe"), 170 - 2 * STRIKE_DAMAGE);
    }

    #[test]
    fn test_sleep_blocks_until_it_wears_off() {
        let mut session = duel();
        apply_status(session.combatant_mut("foe"), StatusKind::Sleep, None);

        assert_eq!(
            session.pass_blocked_turn().unwrap_err(),
            BattleEngineError::from(IllegalStateError::ActorNotBlocked("hero".to_string()))
        );

        for round in 1..=3 {
            session
                .submit_action("hero", "guard", None, &mut rng(&[HIT, HIT]))
                .unwrap();
            assert_eq!(session.pending_actor_block(), Some(StatusKind::Sleep));

            let err = session
                .submit_action("foe", "strike", Some("hero"), &mut rng(&[]))
                .unwrap_err();
            assert_eq!(
                err,
                BattleEngineError::from(ValidationError::ActorBlocked {
                    actor: "foe".to_string(),
                    status: StatusKind::Sleep,
                })
            );

            let turn = session.pass_blocked_turn().unwrap();
            assert_eq!(turn.actor, "foe");
            assert_eq!(turn.blocked_by, Some(StatusKind::Sleep));
            assert_eq!(turn.move_id, None);

            let expired = turn.events.contains(&BattleEvent::StatusExpired {
                target: "Foe".to_string(),
                status: StatusKind::Sleep,
            });
            assert_eq!(expired, round == 3, "sleep should expire after round 3");
        }

        session
            .submit_action("hero", "guard", None, &mut rng(&[HIT, HIT]))
            .unwrap();
        assert_eq!(session.pending_actor_block(), None);
        // Hero is protected, so the strike makes no draws.
        let turn = session
            .submit_action("foe", "strike", Some("hero"), &mut rng(&[]))
            .unwrap();
        assert!(!turn.hit);
    }

    #[test]
    fn test_protect_shields_for_the_rest_of_the_round() {
        let mut session = duel();

        session
            .submit_action("hero", "guard", None, &mut rng(&[HIT, HIT]))
            .unwrap();
        let turn = session
            .submit_action("foe", "strike", Some("hero"), &mut rng(&[]))
            .unwrap();

        assert!(turn.events.contains(&BattleEvent::MoveProtected {
            target: "Hero".to_string(),
        }));
        assert!(turn.events.contains(&BattleEvent::StatusExpired {
            target: "Hero".to_string(),
            status: StatusKind::Protect,
        }));
        assert_eq!(turn.damage, 0);
        assert_eq!(hp(&session, "hero"), 170);
        assert!(!has_status(&session, "hero", StatusKind::Protect));
    }

    #[test]
    fn test_confusion_self_hit_replaces_the_move() {
        let mut session = duel();
        apply_status(session.combatant_mut("hero"), StatusKind::Confusion, None);

        let turn = session
            .submit_action("hero", "strike", Some("foe"), &mut rng(&[1, MAX_VARIANCE]))
            .unwrap();

        // 40-power typeless hit against its own defense.
        assert!(turn.events.contains(&BattleEvent::ConfusionSelfHit {
            actor: "Hero".to_string(),
            damage: 19,
            remaining_hp: 151,
        }));
        assert!(turn.outcomes.is_empty());
        assert_eq!(turn.move_id.as_deref(), Some("strike"));
        assert_eq!(hp(&session, "hero"), 151);
        assert_eq!(hp(&session, "foe"), 170);

        session
            .submit_action("foe", "guard", None, &mut rng(&[HIT, HIT]))
            .unwrap();

        let mut rolls = vec![34];
        rolls.extend(strike_rolls());
        session
            .submit_action("hero", "strike", Some("foe"), &mut rng(&rolls))
            .unwrap();
        assert_eq!(hp(&session, "foe"), 170 - STRIKE_DAMAGE);
    }

    #[test]
    fn test_confusion_wears_off() {
        let mut session = duel();
        let turn = session
            .submit_action("hero", "strike", Some("foe"), &mut rng(&strike_rolls()))
            .unwrap();
        assert_eq!(turn.status_applied, None);

        let turn = session
            .submit_action("foe", "confuse_ray", Some("hero"), &mut rng(&[HIT, HIT]))
            .unwrap();
        assert_eq!(turn.status_applied, Some(StatusKind::Confusion));
        assert!(has_status(&session, "hero", StatusKind::Confusion));

        // Three rounds: the one it landed in plus two more.
        for _ in 0..2 {
            session
                .submit_action("hero", "guard", None, &mut rng(&[50, HIT, HIT]))
                .unwrap();
            session
                .submit_action("foe", "guard", None, &mut rng(&[HIT, HIT]))
                .unwrap();
        }
        assert!(!has_status(&session, "hero", StatusKind::Confusion));
    }
}
