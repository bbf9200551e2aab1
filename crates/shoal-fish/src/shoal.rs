//! The school: every fish's model, machine and view, advanced together.

use std::time::Instant;

use anyhow::{bail, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use shoal_config::ShoalConfig;
use shoal_core::bus::EventBus;
use shoal_core::command::Roster;
use shoal_core::event::Event;
use shoal_core::geometry::Vec2;
use shoal_core::tween::TweenEngine;
use shoal_ui::container::{Transform, WorldShape};

use crate::machine::{FishStateMachine, SchoolTweens, StateContext};
use crate::navigation::NavigationModel;
use crate::palette::assign_colors;
use crate::state::FishState;
use crate::states::school_machine;
use crate::view::FishView;

/// Owns the whole simulation. Fish ids are indices into every vector.
///
/// Dropping the school shuts down every machine, which releases their
/// poke subscriptions and tweens.
pub struct Shoal {
    navs: Vec<NavigationModel>,
    machines: Vec<FishStateMachine>,
    views: Vec<FishView>,
    tweens: SchoolTweens,
    bus: EventBus,
    viewport: Vec2,
}

impl Shoal {
    pub fn new(config: &ShoalConfig, viewport: Vec2, bus: EventBus) -> Result<Self> {
        let school = &config.school;
        let mut seeds = match school.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let colors = assign_colors(school, &mut seeds);

        let mut navs = Vec::with_capacity(school.fish_count);
        let mut machines = Vec::with_capacity(school.fish_count);
        let mut views = Vec::with_capacity(school.fish_count);
        for (fish_id, &color) in colors.iter().enumerate() {
            let mut nav = NavigationModel::new(viewport, SmallRng::seed_from_u64(seeds.gen()));
            let mut machine = school_machine(fish_id)?;
            let view = FishView::new(
                &mut nav,
                &mut machine,
                &config.rig,
                color,
                &bus,
                SmallRng::seed_from_u64(seeds.gen()),
            )?;
            navs.push(nav);
            machines.push(machine);
            views.push(view);
        }
        tracing::info!(
            fish = school.fish_count,
            colorful = school.colorful_count,
            seeded = school.seed.is_some(),
            "school created"
        );

        Ok(Self {
            navs,
            machines,
            views,
            tweens: TweenEngine::new(),
            bus,
            viewport,
        })
    }

    /// Set every fish swimming, highest id first.
    pub fn start(&mut self, now: Instant) -> Result<()> {
        for fish_id in (0..self.machines.len()).rev() {
            let mut ctx = StateContext {
                fish_id,
                now,
                nav: &mut self.navs[fish_id],
                tweens: &mut self.tweens,
                bus: &self.bus,
            };
            self.machines[fish_id].set_state(FishState::MovingForward, &mut ctx)?;
        }
        Ok(())
    }

    /// Run one frame: deliver events, advance tweens, poll machines, then
    /// redraw every view. Returns the delivered events for the caller.
    pub fn update(&mut self, now: Instant, dt: f64) -> Result<Vec<Event>> {
        let events = self.bus.dispatch();
        self.tweens.tick(now, &mut self.navs[..]);
        for (fish_id, machine) in self.machines.iter_mut().enumerate() {
            let mut ctx = StateContext {
                fish_id,
                now,
                nav: &mut self.navs[fish_id],
                tweens: &mut self.tweens,
                bus: &self.bus,
            };
            machine.update(&mut ctx)?;
        }
        for (view, nav) in self.views.iter_mut().zip(&self.navs) {
            view.update(nav, dt);
        }
        Ok(events)
    }

    pub fn poke(&self, fish_id: usize) -> Result<()> {
        if fish_id >= self.navs.len() {
            bail!("no fish with id {} (school has {})", fish_id, self.navs.len());
        }
        self.bus.publish(Event::FishPoke { fish_id });
        Ok(())
    }

    pub fn poke_all(&self) {
        for fish_id in 0..self.navs.len() {
            self.bus.publish(Event::FishPoke { fish_id });
        }
    }

    /// New tank size: every fish learns it and gets startled.
    pub fn resize(&mut self, viewport: Vec2) {
        if viewport == self.viewport {
            return;
        }
        tracing::debug!(width = viewport.x, height = viewport.y, "tank resized");
        self.viewport = viewport;
        for nav in &mut self.navs {
            nav.set_viewport(viewport);
        }
        self.poke_all();
    }

    /// Track the pointer in world space. Returns whether it is over a fish.
    pub fn pointer_move(&mut self, point: Vec2) -> bool {
        self.views
            .iter_mut()
            .fold(false, |over, view| view.container_mut().pointer_move(point) || over)
    }

    pub fn pointer_up(&mut self, point: Vec2) -> bool {
        self.views
            .iter_mut()
            .fold(false, |hit, view| view.container_mut().pointer_up(point) || hit)
    }

    /// Every fish outline in world space, lowest id drawn first.
    pub fn world_shapes(&self) -> Vec<WorldShape> {
        self.views
            .iter()
            .flat_map(|view| view.container().world_shapes(&Transform::IDENTITY, 1.0))
            .collect()
    }

    /// How many fish are in each state.
    pub fn state_counts(&self) -> Vec<(FishState, usize)> {
        FishState::ALL
            .iter()
            .map(|&state| {
                let count = self
                    .machines
                    .iter()
                    .filter(|m| m.current_state() == Some(state))
                    .count();
                (state, count)
            })
            .collect()
    }

    pub fn rushing_count(&self) -> usize {
        self.navs.iter().filter(|nav| nav.is_rush()).count()
    }

    pub fn len(&self) -> usize {
        self.navs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.navs.is_empty()
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn navigation(&self, fish_id: usize) -> Option<&NavigationModel> {
        self.navs.get(fish_id)
    }

    pub fn state(&self, fish_id: usize) -> Option<FishState> {
        self.machines.get(fish_id).and_then(|m| m.current_state())
    }

    pub fn view(&self, fish_id: usize) -> Option<&FishView> {
        self.views.get(fish_id)
    }
}

impl Roster for Shoal {
    fn fish_count(&self) -> usize {
        self.len()
    }

    fn describe(&self, fish_id: usize) -> Option<String> {
        let nav = self.navs.get(fish_id)?;
        let state = self
            .state(fish_id)
            .map_or("stopped", FishState::name);
        let p = nav.position();
        Some(format!(
            "#{:<3} {:<14} {:<5} pos=({:.0}, {:.0}) speed={:.0}",
            fish_id,
            state,
            if nav.is_rush() { "RUSH" } else { "" },
            p.x,
            p.y,
            nav.speed()
        ))
    }
}

impl Drop for Shoal {
    fn drop(&mut self) {
        for ((machine, nav), view) in self.machines.iter_mut().zip(&mut self.navs).zip(&self.views) {
            machine.shutdown(&mut self.tweens);
            view.detach(nav, machine);
        }
        tracing::debug!(fish = self.navs.len(), "school shut down");
    }
}
