use maud::{Markup, html};

use crate::{
    card::Card,
    html::{FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
    money::format_money,
};

/// A drop-down for picking one of `cards`.
pub(super) fn card_select(name: &str, label: &str, cards: &[Card]) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            select id=(name) name=(name) required class=(FORM_TEXT_INPUT_STYLE)
            {
                @for card in cards {
                    option value=(card.id)
                    {
                        (card.name) " " (card.account_no) " (" (format_money(card.balance, card.currency)) ")"
                    }
                }
            }
        }
    }
}

/// The amount input, labelled as being in the sending card's currency.
pub(super) fn amount_input() -> Markup {
    html! {
        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount (in the sending card's currency)" }

            input
                id="amount"
                type="number"
                name="amount"
                step="0.01"
                min="0.01"
                placeholder="0.00"
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}
