// Spriteweave - Custom sprite insertion for SNES ROM images
// Copyright (C) 2026  Marcel Joachim Kloubert <marcel@kloubert.dev>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! JSON descriptor parser.
//!
//! JSON descriptors carry the same data as CFG files, with the tweak bytes
//! spelled out as named flags, plus map16 tiles and Lunar Magic display
//! and collection data.

use std::path::Path;

use base64::Engine;
use serde::Deserialize;

use super::malformed;
use crate::error::Result;
use crate::sprite::{Collection, Display, DisplayTile, SpriteSlot};
use crate::tiles::quads_from_bytes;

/// Pack flags into a byte, least significant bit first.
fn pack(bits: &[bool]) -> u8 {
    bits.iter()
        .enumerate()
        .fold(0, |byte, (i, &set)| if set { byte | (1 << i) } else { byte })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Tweak1656 {
    #[serde(rename = "Object Clipping")]
    object_clipping: u8,
    #[serde(rename = "Can be jumped on")]
    can_be_jumped_on: bool,
    #[serde(rename = "Dies when jumped on")]
    dies_when_jumped_on: bool,
    #[serde(rename = "Hop in/kick shell")]
    hop_in_shell: bool,
    #[serde(rename = "Disappears in cloud of smoke")]
    disappears_in_smoke: bool,
}

impl Tweak1656 {
    fn to_byte(&self) -> u8 {
        (self.object_clipping & 0x0F)
            | pack(&[
                false,
                false,
                false,
                false,
                self.can_be_jumped_on,
                self.dies_when_jumped_on,
                self.hop_in_shell,
                self.disappears_in_smoke,
            ])
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Tweak1662 {
    #[serde(rename = "Sprite Clipping")]
    sprite_clipping: u8,
    #[serde(rename = "Use shell as death frame", alias = "USe shell as death frame")]
    shell_death_frame: bool,
    #[serde(rename = "Fall straight down when killed")]
    fall_straight_down: bool,
}

impl Tweak1662 {
    fn to_byte(&self) -> u8 {
        (self.sprite_clipping & 0x3F)
            | (u8::from(self.shell_death_frame) << 6)
            | (u8::from(self.fall_straight_down) << 7)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Tweak166E {
    #[serde(rename = "Use second graphics page")]
    second_page: bool,
    #[serde(rename = "Palette")]
    palette: u8,
    #[serde(rename = "Disable fireball killing")]
    no_fireball: bool,
    #[serde(rename = "Disable cape killing")]
    no_cape: bool,
    #[serde(rename = "Disable water splash")]
    no_splash: bool,
    #[serde(rename = "Don't interact with Layer 2")]
    no_layer2: bool,
}

impl Tweak166E {
    fn to_byte(&self) -> u8 {
        u8::from(self.second_page)
            | ((self.palette & 0x07) << 1)
            | pack(&[
                false,
                false,
                false,
                false,
                self.no_fireball,
                self.no_cape,
                self.no_splash,
                self.no_layer2,
            ])
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Tweak167A {
    #[serde(rename = "Don't disable cliping when starkilled")]
    keep_clipping_starkilled: bool,
    #[serde(rename = "Invincible to star/cape/fire/bounce blk.")]
    invincible: bool,
    #[serde(rename = "Process when off screen")]
    process_offscreen: bool,
    #[serde(rename = "Don't change into shell when stunned")]
    no_shell_when_stunned: bool,
    #[serde(rename = "Can't be kicked like shell")]
    not_kickable: bool,
    #[serde(rename = "Process interaction with Mario every frame")]
    interact_every_frame: bool,
    #[serde(rename = "Gives power-up when eaten by yoshi")]
    gives_powerup: bool,
    #[serde(rename = "Don't use default interaction with Mario")]
    no_default_interaction: bool,
}

impl Tweak167A {
    fn to_byte(&self) -> u8 {
        pack(&[
            self.keep_clipping_starkilled,
            self.invincible,
            self.process_offscreen,
            self.no_shell_when_stunned,
            self.not_kickable,
            self.interact_every_frame,
            self.gives_powerup,
            self.no_default_interaction,
        ])
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Tweak1686 {
    #[serde(rename = "Inedible")]
    inedible: bool,
    #[serde(rename = "Stay in Yoshi's mouth")]
    stay_in_mouth: bool,
    #[serde(rename = "Weird ground behaviour")]
    weird_ground: bool,
    #[serde(rename = "Don't interact with other sprites")]
    no_sprite_interaction: bool,
    #[serde(rename = "Don't change direction if touched")]
    keep_direction: bool,
    #[serde(rename = "Don't turn into coin when goal passed")]
    no_goal_coin: bool,
    #[serde(rename = "Spawn a new sprite")]
    spawns_sprite: bool,
    #[serde(rename = "Don't interact with objects")]
    no_object_interaction: bool,
}

impl Tweak1686 {
    fn to_byte(&self) -> u8 {
        pack(&[
            self.inedible,
            self.stay_in_mouth,
            self.weird_ground,
            self.no_sprite_interaction,
            self.keep_direction,
            self.no_goal_coin,
            self.spawns_sprite,
            self.no_object_interaction,
        ])
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Tweak190F {
    #[serde(rename = "Make platform passable from below")]
    passable_from_below: bool,
    #[serde(rename = "Don't erase when goal passed")]
    keep_on_goal: bool,
    #[serde(rename = "Can't be killed by sliding")]
    no_slide_kill: bool,
    #[serde(rename = "Takes 5 fireballs to kill")]
    five_fireballs: bool,
    #[serde(rename = "Can be jumped on with upwards Y speed")]
    jump_with_upward_speed: bool,
    #[serde(rename = "Death frame two tiles high")]
    tall_death_frame: bool,
    #[serde(rename = "Don't turn into a coin with silver POW")]
    no_silver_coin: bool,
    #[serde(rename = "Don't get stuck in walls (carryable sprites)")]
    no_wall_stuck: bool,
}

impl Tweak190F {
    fn to_byte(&self) -> u8 {
        pack(&[
            self.passable_from_below,
            self.keep_on_goal,
            self.no_slide_kill,
            self.five_fireballs,
            self.jump_with_upward_speed,
            self.tall_death_frame,
            self.no_silver_coin,
            self.no_wall_stuck,
        ])
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonTile {
    #[serde(rename = "X offset")]
    x_offset: i32,
    #[serde(rename = "Y offset")]
    y_offset: i32,
    #[serde(rename = "map16 tile")]
    tile: u16,
    #[serde(rename = "Text")]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct JsonDisplay {
    description: Option<String>,
    tiles: Vec<JsonTile>,
    extra_bit: bool,
    #[serde(rename = "X")]
    x: u8,
    #[serde(rename = "Y")]
    y: u8,
    display_text: Option<String>,
    use_text: bool,
}

impl From<JsonDisplay> for Display {
    fn from(json: JsonDisplay) -> Self {
        Display {
            description: json.description.unwrap_or_default(),
            tiles: json
                .tiles
                .into_iter()
                .map(|t| DisplayTile {
                    x_offset: t.x_offset,
                    y_offset: t.y_offset,
                    tile: t.tile,
                    text: t.text.unwrap_or_default(),
                })
                .collect(),
            extra_bit: json.extra_bit,
            x: json.x,
            y: json.y,
            display_text: json.display_text.unwrap_or_default(),
            use_text: json.use_text,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonCollection {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "ExtraBit")]
    extra_bit: bool,
    #[serde(rename = "Extra Property Byte 1")]
    prop1: u8,
    #[serde(rename = "Extra Property Byte 2")]
    prop2: u8,
    #[serde(rename = "Extra Property Byte 3")]
    prop3: u8,
    #[serde(rename = "Extra Property Byte 4")]
    prop4: u8,
    #[serde(rename = "Extra Property Byte 5")]
    prop5: u8,
    #[serde(rename = "Extra Property Byte 6")]
    prop6: u8,
    #[serde(rename = "Extra Property Byte 7")]
    prop7: u8,
    #[serde(rename = "Extra Property Byte 8")]
    prop8: u8,
    #[serde(rename = "Extra Property Byte 9")]
    prop9: u8,
    #[serde(rename = "Extra Property Byte 10")]
    prop10: u8,
    #[serde(rename = "Extra Property Byte 11")]
    prop11: u8,
    #[serde(rename = "Extra Property Byte 12")]
    prop12: u8,
}

impl From<JsonCollection> for Collection {
    fn from(json: JsonCollection) -> Self {
        Collection {
            name: json.name,
            extra_bit: json.extra_bit,
            props: [
                json.prop1,
                json.prop2,
                json.prop3,
                json.prop4,
                json.prop5,
                json.prop6,
                json.prop7,
                json.prop8,
                json.prop9,
                json.prop10,
                json.prop11,
                json.prop12,
            ],
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonSprite {
    #[serde(rename = "$1656", default)]
    t1656: Tweak1656,
    #[serde(rename = "$1662", default)]
    t1662: Tweak1662,
    #[serde(rename = "$166E", default)]
    t166e: Tweak166E,
    #[serde(rename = "$167A", default)]
    t167a: Tweak167A,
    #[serde(rename = "$1686", default)]
    t1686: Tweak1686,
    #[serde(rename = "$190F", default)]
    t190f: Tweak190F,
    #[serde(rename = "AsmFile")]
    asm_file: String,
    #[serde(rename = "ActLike")]
    act_like: u8,
    #[serde(rename = "Type")]
    sprite_type: u8,
    #[serde(rename = "Extra Property Byte 1", default)]
    extra1: u8,
    #[serde(rename = "Extra Property Byte 2", default)]
    extra2: u8,
    #[serde(rename = "Additional Byte Count (extra bit clear)", default)]
    byte_count: u8,
    #[serde(rename = "Additional Byte Count (extra bit set)", default)]
    extra_byte_count: u8,
    #[serde(rename = "Map16", default)]
    map16: String,
    #[serde(rename = "Displays", default)]
    displays: Vec<JsonDisplay>,
    #[serde(rename = "Collection", default)]
    collections: Vec<JsonCollection>,
}

/// Apply a JSON descriptor to a slot.
pub fn apply_json(text: &str, file: &Path, slot: &mut SpriteSlot) -> Result<()> {
    let json: JsonSprite =
        serde_json::from_str(text).map_err(|e| malformed(file, e.to_string()))?;

    let map16 = base64::engine::general_purpose::STANDARD
        .decode(json.map16.trim())
        .map_err(|e| malformed(file, format!("invalid Map16 data: {}", e)))?;

    slot.table.sprite_type = json.sprite_type;
    slot.table.act_like = json.act_like;
    slot.table.extra = [json.extra1, json.extra2];
    slot.table.tweak = [
        json.t1656.to_byte(),
        json.t1662.to_byte(),
        json.t166e.to_byte(),
        json.t167a.to_byte(),
        json.t1686.to_byte(),
        json.t190f.to_byte(),
    ];
    slot.set_byte_counts(json.byte_count, json.extra_byte_count);

    let base = file.parent().unwrap_or_else(|| Path::new(""));
    slot.asm_file = Some(base.join(json.asm_file.trim()));
    slot.map16 = quads_from_bytes(&map16);
    slot.displays = json.displays.into_iter().map(Display::from).collect();
    slot.collections = json.collections.into_iter().map(Collection::from).collect();
    Ok(())
}
