use std::collections::VecDeque;

use eframe::egui;

use crate::models::{Notification, NotificationLevel};

/// Blocking modal notifications, shown one at a time in arrival order.
#[derive(Default)]
pub struct NotificationCenter {
    queue: VecDeque<Notification>,
}

impl NotificationCenter {
    pub fn push(&mut self, notification: Notification) {
        self.queue.push_back(notification);
    }

    pub fn current(&self) -> Option<&Notification> {
        self.queue.front()
    }

    pub fn dismiss(&mut self) -> Option<Notification> {
        self.queue.pop_front()
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        let Some(notification) = self.current() else {
            return;
        };

        let color = match notification.level {
            NotificationLevel::Success => egui::Color32::LIGHT_GREEN,
            NotificationLevel::Error => egui::Color32::LIGHT_RED,
        };
        let title = notification.title.clone();
        let text = notification.text.clone();

        let modal = egui::Modal::new(egui::Id::new("regdesk_notification")).show(ctx, |ui| {
            ui.set_min_width(360.0);
            ui.heading(egui::RichText::new(title).color(color));
            ui.add_space(8.0);
            ui.label(text);
            ui.add_space(12.0);
            ui.button("OK").clicked()
        });

        if modal.inner || modal.should_close() {
            self.dismiss();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifications_are_shown_in_arrival_order() {
        let mut center = NotificationCenter::default();
        assert!(center.current().is_none());

        center.push(Notification::success("File Uploaded!", "File uploaded successfully!"));
        center.push(Notification::error("Essay too long"));

        assert_eq!(center.current().map(|n| n.title.as_str()), Some("File Uploaded!"));
        center.dismiss();
        assert_eq!(center.current().map(|n| n.text.as_str()), Some("Essay too long"));
        center.dismiss();
        assert!(center.dismiss().is_none());
    }
}
